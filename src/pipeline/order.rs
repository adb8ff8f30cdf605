//! Order resolution: put pages into document order.

use crate::output::Page;

/// Sort pages ascending by page number.
///
/// `sort_by_key` is stable: pages sharing a number keep their discovery
/// order.
pub fn resolve_order(pages: &mut [Page]) {
    pages.sort_by_key(Page::page_number);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn sorts_ascending() {
        let mut pages = vec![
            Page::new("a3.jpg", 3),
            Page::new("a1.jpg", 1),
            Page::new("a2.jpg", 2),
        ];
        resolve_order(&mut pages);
        let names: Vec<_> = pages.iter().map(|p| p.source_path()).collect();
        assert_eq!(
            names,
            vec![Path::new("a1.jpg"), Path::new("a2.jpg"), Path::new("a3.jpg")]
        );
    }

    #[test]
    fn equal_numbers_keep_discovery_order() {
        let mut pages = vec![
            Page::new("z/p5.jpg", 5),
            Page::new("y/p1.jpg", 1),
            Page::new("x/p5.jpg", 5),
            Page::new("w/p5.jpg", 5),
            Page::new("v/p0.jpg", 0),
        ];
        resolve_order(&mut pages);
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.source_path().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["v/p0.jpg", "y/p1.jpg", "z/p5.jpg", "x/p5.jpg", "w/p5.jpg"]
        );
    }

    #[test]
    fn empty_is_fine() {
        let mut pages: Vec<Page> = Vec::new();
        resolve_order(&mut pages);
        assert!(pages.is_empty());
    }
}
