use std::fmt;

/// One entity type's push-then-pull step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Stores,
    ShoppingList,
    SingleItems,
    IndexWeights,
    Recipes,
    RecipeItems,
}

/// Phases in execution order.
///
/// Parents come before the children that reference them: index weights need
/// resolved stores, recipe items need resolved recipes. The shopping list
/// runs before the catalog phase because its merge creates any missing
/// catalog rows itself, which the catalog phase then pushes.
pub const PIPELINE: [Phase; 6] = [
    Phase::Stores,
    Phase::ShoppingList,
    Phase::SingleItems,
    Phase::IndexWeights,
    Phase::Recipes,
    Phase::RecipeItems,
];

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Stores => "stores",
            Phase::ShoppingList => "shopping list",
            Phase::SingleItems => "single items",
            Phase::IndexWeights => "index weights",
            Phase::Recipes => "recipes",
            Phase::RecipeItems => "recipe items",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(phase: Phase) -> usize {
        PIPELINE.iter().position(|p| *p == phase).unwrap()
    }

    #[test]
    fn test_parents_run_before_children() {
        assert!(position(Phase::Stores) < position(Phase::IndexWeights));
        assert!(position(Phase::SingleItems) < position(Phase::IndexWeights));
        assert!(position(Phase::Recipes) < position(Phase::RecipeItems));
    }

    #[test]
    fn test_display() {
        assert_eq!(Phase::ShoppingList.to_string(), "shopping list");
        assert_eq!(Phase::RecipeItems.to_string(), "recipe items");
    }
}
