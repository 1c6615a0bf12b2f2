use serde::{Deserialize, Serialize};

/// A concrete derivation: either a leaf (primitive or unresolved element) or a node with exactly
/// two ingredient subtrees.
///
/// The JSON shape `{name, children?, highlight?}` is the interchange format consumed by existing
/// front-ends, so empty `children` and a false `highlight` are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationTree {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DerivationTree>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub highlight: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl DerivationTree {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            highlight: false,
        }
    }

    pub fn combine(name: impl Into<String>, left: DerivationTree, right: DerivationTree) -> Self {
        Self {
            name: name.into(),
            children: vec![left, right],
            highlight: false,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of combination levels (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Pre-order traversal.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter { stack: vec![self] }
    }
}

pub struct TreeIter<'a> {
    stack: Vec<&'a DerivationTree>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = &'a DerivationTree;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
