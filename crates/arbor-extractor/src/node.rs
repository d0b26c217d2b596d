//! Extraction tree

use crate::error::TreeError;
use crate::extractor::Extractor;
use crate::types::ResultMap;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// One extractor plus the branches its category answer selects
///
/// Trees are validated when built and immutable afterwards, so one tree can
/// serve any number of documents, from any number of threads.
#[derive(Debug, Clone)]
pub struct Node {
    extractor: Extractor,
    children: BTreeMap<String, Vec<Node>>,
}

impl Node {
    /// Create a node without children
    pub fn leaf(extractor: Extractor) -> Self {
        Self {
            extractor,
            children: BTreeMap::new(),
        }
    }

    /// Create a node with child branches keyed by category label
    ///
    /// Fails if children are attached to a non-category extractor, if a
    /// branch label is not one of the extractor's categories, or if any
    /// extractor name occurs twice in the resulting subtree.
    pub fn new<I, S>(extractor: Extractor, children: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (S, Vec<Node>)>,
        S: Into<String>,
    {
        let mut branches: BTreeMap<String, Vec<Node>> = BTreeMap::new();
        for (label, nodes) in children {
            branches.entry(label.into()).or_default().extend(nodes);
        }

        // Every supplied label is checked, even one with no nodes
        if !branches.is_empty() {
            let categories = extractor
                .categories()
                .ok_or_else(|| TreeError::ChildrenOnNonCategory {
                    name: extractor.name().to_string(),
                })?;
            if let Some(label) = branches.keys().find(|label| !categories.contains(label)) {
                return Err(TreeError::UnknownChildCategory {
                    name: extractor.name().to_string(),
                    label: label.clone(),
                });
            }
        }
        branches.retain(|_, nodes| !nodes.is_empty());

        let node = Self {
            extractor,
            children: branches,
        };
        node.check_unique_names()?;
        Ok(node)
    }

    /// The wrapped extractor
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Child nodes run when the extractor answers `label`
    pub fn children(&self, label: &str) -> &[Node] {
        self.children.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Branch labels with children, in sorted order
    pub fn branch_labels(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Every extractor name in the subtree, pre-order
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        names.push(self.extractor.name());
        for nodes in self.children.values() {
            for child in nodes {
                child.collect_names(names);
            }
        }
    }

    fn check_unique_names(&self) -> Result<(), TreeError> {
        let mut seen = HashSet::new();
        let mut repeated: Vec<String> = Vec::new();
        for name in self.names() {
            if !seen.insert(name) && !repeated.iter().any(|r| r == name) {
                repeated.push(name.to_string());
            }
        }

        if repeated.is_empty() {
            Ok(())
        } else {
            Err(TreeError::DuplicateName { names: repeated })
        }
    }

    /// Extract every value on the path the document takes through the tree
    ///
    /// The root's value is always present. Children run only when the
    /// extractor's value names one of their branches; `NA` and answers without
    /// a branch end the descent there.
    pub fn extract(&self, doc_text: &str) -> ResultMap {
        let mut results = ResultMap::new();
        self.extract_into(doc_text, &mut results);
        results
    }

    fn extract_into(&self, doc_text: &str, results: &mut ResultMap) {
        let name = self.extractor.name();
        info!("Running extractor '{}'", name);

        let value = self.extractor.extract(doc_text);
        let branch = self.children(&value);
        if branch.is_empty() && !self.children.is_empty() {
            debug!("Node '{}': no branch for '{}'", name, value);
        }
        results.insert(name, value.as_str());

        for child in branch {
            child.extract_into(doc_text, results);
        }
    }

    /// Extract several documents concurrently against this tree
    ///
    /// Documents are spread over the current rayon pool, so the number of
    /// threads stays bounded however many documents come in. Results come
    /// back in input order; the backends must tolerate concurrent calls.
    pub fn extract_many(&self, docs: &[&str]) -> Vec<ResultMap> {
        match docs {
            [] => Vec::new(),
            [doc] => vec![self.extract(doc)],
            _ => docs.par_iter().map(|doc| self.extract(doc)).collect(),
        }
    }
}

impl From<Extractor> for Node {
    fn from(extractor: Extractor) -> Self {
        Node::leaf(extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_domain::ModelBackend;
    use arbor_llm::MockModel;
    use std::sync::Arc;

    fn model() -> Arc<dyn ModelBackend> {
        Arc::new(MockModel::new())
    }

    fn category(name: &str, categories: &[&str]) -> Extractor {
        Extractor::category(name, "?", categories.iter().copied(), model()).unwrap()
    }

    fn text(name: &str) -> Extractor {
        Extractor::text(name, "?", model()).unwrap()
    }

    #[test]
    fn test_children_on_text_extractor_rejected() {
        let result = Node::new(text("root"), [("x", vec![Node::leaf(text("child"))])]);
        assert_eq!(
            result.unwrap_err(),
            TreeError::ChildrenOnNonCategory {
                name: "root".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_branch_still_checked() {
        assert_eq!(
            Node::new(text("root"), [("x", Vec::new())]).unwrap_err(),
            TreeError::ChildrenOnNonCategory {
                name: "root".to_string(),
            }
        );

        let result = Node::new(category("root", &["lease"]), [("invoice", Vec::new())]);
        assert!(matches!(
            result,
            Err(TreeError::UnknownChildCategory { label, .. }) if label == "invoice"
        ));

        let tree = Node::new(category("root", &["lease"]), [("lease", Vec::new())]).unwrap();
        assert_eq!(tree.branch_labels().count(), 0);
        assert!(Node::new(text("root"), Vec::<(String, Vec<Node>)>::new()).is_ok());
    }

    #[test]
    fn test_unknown_branch_label_rejected() {
        let result = Node::new(
            category("root", &["lease", "employment"]),
            [("invoice", vec![Node::leaf(text("amount"))])],
        );
        assert!(matches!(
            result,
            Err(TreeError::UnknownChildCategory { label, .. }) if label == "invoice"
        ));
    }

    #[test]
    fn test_duplicate_names_rejected_anywhere_in_subtree() {
        let inner = Node::new(
            category("kind", &["a"]),
            [("a", vec![Node::leaf(text("rent"))])],
        )
        .unwrap();
        let result = Node::new(
            category("root", &["x", "y"]),
            [("x", vec![inner]), ("y", vec![Node::leaf(text("rent"))])],
        );
        assert_eq!(
            result.unwrap_err(),
            TreeError::DuplicateName {
                names: vec!["rent".to_string()],
            }
        );
    }

    #[test]
    fn test_child_named_like_root_rejected() {
        let result = Node::new(category("root", &["x"]), [("x", vec![Node::leaf(text("root"))])]);
        assert!(matches!(result, Err(TreeError::DuplicateName { .. })));
    }

    #[test]
    fn test_names_pre_order() {
        let tree = Node::new(
            category("root", &["b", "a"]),
            [
                ("b", vec![Node::leaf(text("b1")), Node::leaf(text("b2"))]),
                ("a", vec![Node::leaf(text("a1"))]),
            ],
        )
        .unwrap();
        assert_eq!(tree.names(), vec!["root", "a1", "b1", "b2"]);
    }

    #[test]
    fn test_repeated_label_appends_to_branch() {
        let tree = Node::new(
            category("root", &["x"]),
            [
                ("x", vec![Node::leaf(text("first"))]),
                ("x", vec![Node::leaf(text("second"))]),
            ],
        )
        .unwrap();
        assert_eq!(tree.children("x").len(), 2);
        assert!(tree.children("missing").is_empty());
    }

    #[test]
    fn test_extract_follows_matching_branch_only() {
        // MockModel echoes the document, so "lease" classifies as lease
        let tree = Node::new(
            category("doc_type", &["lease", "employment"]),
            [
                ("lease", vec![Node::leaf(text("tenant"))]),
                ("employment", vec![Node::leaf(text("employer"))]),
            ],
        )
        .unwrap();

        let results = tree.extract("lease");
        assert_eq!(results.names().collect::<Vec<_>>(), vec!["doc_type", "tenant"]);
        assert_eq!(results.get("tenant"), Some("lease"));
    }

    #[test]
    fn test_extract_off_label_stops_at_root() {
        let tree = Node::new(
            category("doc_type", &["lease"]),
            [("lease", vec![Node::leaf(text("tenant"))])],
        )
        .unwrap();

        let results = tree.extract("invoice");
        assert_eq!(results.len(), 1);
        assert_eq!(results.get("doc_type"), Some("NA"));
    }

    #[test]
    fn test_extract_many_keeps_input_order() {
        let tree = Node::new(
            category("doc_type", &["lease", "employment"]),
            [("employment", vec![Node::leaf(text("employer"))])],
        )
        .unwrap();

        let results = tree.extract_many(&["employment", "lease", "other"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].get("employer"), Some("employment"));
        assert_eq!(results[1].get("doc_type"), Some("lease"));
        assert!(!results[1].contains_key("employer"));
        assert_eq!(results[2].get("doc_type"), Some("NA"));
        assert!(tree.extract_many(&[]).is_empty());
    }

    #[test]
    fn test_extract_many_more_documents_than_workers() {
        let tree = Node::new(
            category("doc_type", &["lease", "employment"]),
            [("lease", vec![Node::leaf(text("tenant"))])],
        )
        .unwrap();
        let docs: Vec<&str> = ["lease", "employment", "other"]
            .into_iter()
            .cycle()
            .take(12)
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let results = pool.install(|| tree.extract_many(&docs));

        assert_eq!(results.len(), docs.len());
        for (doc, result) in docs.iter().zip(&results) {
            match *doc {
                "lease" => assert_eq!(result.get("tenant"), Some("lease")),
                "employment" => assert_eq!(result.get("doc_type"), Some("employment")),
                _ => assert_eq!(result.get("doc_type"), Some("NA")),
            }
        }
    }
}
