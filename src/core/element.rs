use std::fmt;

/// Dense index of an element inside a [`crate::catalog::registry::Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rank of an element. `None` is the "unknown" sentinel (never derived from the primitives, or
/// missing in a trusted catalog).
pub type Tier = Option<u32>;

/// An unordered ingredient pair. Stored with `a <= b` so equal pairs compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Recipe {
    pub a: ElementId,
    pub b: ElementId,
}

impl Recipe {
    #[inline]
    pub fn new(x: ElementId, y: ElementId) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    #[inline]
    pub fn ingredients(self) -> [ElementId; 2] {
        [self.a, self.b]
    }

    #[inline]
    pub fn uses(self, id: ElementId) -> bool {
        self.a == id || self.b == id
    }

    /// Both ingredients are the same element (`x = a + a`).
    #[inline]
    pub fn is_doubled(self) -> bool {
        self.a == self.b
    }
}

/// One catalog element after normalization.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    /// Identity key (trimmed, lower-case).
    pub key: String,
    /// Spelling used in derivation trees.
    pub display: String,
    pub tier: Tier,
    pub primitive: bool,
    /// Declared recipes in catalog order, deduplicated. May include recipes that violate the
    /// tier invariant; use `Registry::valid_recipes` during search.
    pub recipes: Vec<Recipe>,
}

impl Element {
    #[inline]
    pub fn has_recipes(&self) -> bool {
        !self.recipes.is_empty()
    }
}

/// "Combine `recipe.a` and `recipe.b` to make `product`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipeStep {
    pub product: ElementId,
    pub recipe: Recipe,
}

impl RecipeStep {
    #[inline]
    pub fn new(product: ElementId, recipe: Recipe) -> Self {
        Self { product, recipe }
    }
}
