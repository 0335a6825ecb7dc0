//! Page of layers returned by a bookmark scan

use crate::layer::Layer;
use serde::{Deserialize, Serialize};

/// One page of a paginated ledger scan. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Layers in store iteration order, at most the requested page size.
    pub items: Vec<Layer>,
    /// Bookmark returned by the store for this scan; pass it back to resume.
    pub page_id: String,
    /// Id of the lookahead layer, set only when the page came back full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_id: Option<String>,
    /// Number of layers actually in `items`.
    pub page_size: usize,
}

impl Page {
    /// Whether the scan saw a record beyond this page.
    pub fn has_more(&self) -> bool {
        self.next_page_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_id_omitted_when_unset() {
        let page = Page {
            items: vec![Layer::root("L1")],
            page_id: "4c31".into(),
            next_page_id: None,
            page_size: 1,
        };
        let json = serde_json::to_value(&page).unwrap();

        assert!(json.get("nextPageId").is_none());
        assert_eq!(json["pageId"], "4c31");
        assert_eq!(json["pageSize"], 1);
        assert!(!page.has_more());
    }

    #[test]
    fn test_decodes_terminal_page() {
        let page: Page =
            serde_json::from_str(r#"{"items":[],"pageId":"","pageSize":0}"#).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_page_id, None);
    }
}
