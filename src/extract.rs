//! Text extraction from a live editable-content tree.
//!
//! Rich-text composers represent their content as a nested tree of text
//! runs and elements. Extraction flattens that tree into a single string
//! in document order while inserting a space at block boundaries, so that
//! words separated visually by paragraphs or line breaks are not silently
//! concatenated into one token.

/// Tags that open a block boundary: a separating space is inserted before
/// descending into them when the accumulated text does not already end in
/// whitespace.
const BLOCK_BOUNDARY_TAGS: &[&str] = &["p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Tags that also flush a boundary after their subtree closes, so trailing
/// block content stays separated from whatever follows.
const TRAILING_BOUNDARY_TAGS: &[&str] = &["p", "div"];

/// A node in the editable-content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A literal text run.
    Text(String),
    /// An element with a tag name and children in document order.
    Element {
        /// Lower-cased tag name, e.g. `"p"` or `"span"`.
        tag: String,
        /// Child nodes in document order.
        children: Vec<Node>,
    },
}

impl Node {
    /// Create a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Create an element node. The tag is lower-cased on construction.
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element {
            tag: tag.into().to_ascii_lowercase(),
            children,
        }
    }
}

/// Flatten the tree rooted at `node` into a single string.
///
/// Plain text nodes contribute their literal content; block-level elements
/// contribute a single separating space at each boundary; inline elements
/// contribute only their recursively extracted text. Extraction is
/// idempotent: an unchanged tree always yields an identical string.
#[must_use]
pub fn extract_text(node: &Node) -> String {
    let mut out = String::new();
    walk(node, &mut out);
    out
}

fn walk(node: &Node, out: &mut String) {
    match node {
        Node::Text(content) => out.push_str(content),
        Node::Element { tag, children } => {
            if opens_boundary(tag) && !out.is_empty() && !ends_in_whitespace(out) {
                out.push(' ');
            }

            for child in children {
                walk(child, out);
            }

            if closes_boundary(tag) && !ends_in_whitespace(out) {
                out.push(' ');
            }
        }
    }
}

fn opens_boundary(tag: &str) -> bool {
    BLOCK_BOUNDARY_TAGS.contains(&tag)
}

fn closes_boundary(tag: &str) -> bool {
    TRAILING_BOUNDARY_TAGS.contains(&tag)
}

fn ends_in_whitespace(s: &str) -> bool {
    s.chars().next_back().is_some_and(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_text() {
        let tree = Node::text("hello world");
        assert_eq!(extract_text(&tree), "hello world");
    }

    #[test]
    fn test_extract_block_boundaries() {
        // <div>Hello<p>World</p>Bye</div>
        let tree = Node::element(
            "div",
            vec![
                Node::text("Hello"),
                Node::element("p", vec![Node::text("World")]),
                Node::text("Bye"),
            ],
        );

        assert_eq!(extract_text(&tree), "Hello World Bye ");
    }

    #[test]
    fn test_extract_inline_elements_add_no_boundary() {
        // <div>he<span>llo</span>!</div>
        let tree = Node::element(
            "div",
            vec![
                Node::text("he"),
                Node::element("span", vec![Node::text("llo")]),
                Node::text("!"),
            ],
        );

        assert_eq!(extract_text(&tree), "hello! ");
    }

    #[test]
    fn test_extract_email_split_across_paragraphs_not_joined() {
        let tree = Node::element(
            "div",
            vec![
                Node::element("p", vec![Node::text("user@exam")]),
                Node::element("p", vec![Node::text("ple.com")]),
            ],
        );

        assert_eq!(extract_text(&tree), "user@exam ple.com ");
    }

    #[test]
    fn test_extract_line_break_opens_boundary_without_trailing_flush() {
        // <div>one<br>two</div> - br separates but does not flush on close
        let tree = Node::element(
            "div",
            vec![
                Node::text("one"),
                Node::element("br", vec![]),
                Node::text("two"),
            ],
        );

        assert_eq!(extract_text(&tree), "one two ");
    }

    #[test]
    fn test_extract_never_doubles_a_separator() {
        // Adjacent paragraphs produce exactly one space between their texts.
        let tree = Node::element(
            "div",
            vec![
                Node::element("p", vec![Node::text("a")]),
                Node::element("p", vec![Node::text("b")]),
                Node::element("p", vec![Node::text("c")]),
            ],
        );

        assert_eq!(extract_text(&tree), "a b c ");
    }

    #[test]
    fn test_extract_heading_boundary() {
        let tree = Node::element(
            "div",
            vec![
                Node::element("h1", vec![Node::text("Title")]),
                Node::text("body"),
            ],
        );

        // h1 opens a boundary but only p/div flush on close; the leading
        // boundary is suppressed because the accumulator is still empty.
        assert_eq!(extract_text(&tree), "Titlebody ");
    }

    #[test]
    fn test_extract_preserves_existing_whitespace() {
        // No extra space is inserted when the text already ends in one.
        let tree = Node::element(
            "div",
            vec![
                Node::text("hello "),
                Node::element("p", vec![Node::text("world")]),
            ],
        );

        assert_eq!(extract_text(&tree), "hello world ");
    }

    #[test]
    fn test_extract_idempotent() {
        let tree = Node::element(
            "div",
            vec![
                Node::text("alpha"),
                Node::element("p", vec![Node::text("beta")]),
            ],
        );

        assert_eq!(extract_text(&tree), extract_text(&tree));
    }

    #[test]
    fn test_extract_empty_element() {
        let tree = Node::element("span", vec![]);
        assert_eq!(extract_text(&tree), "");
    }

    #[test]
    fn test_extract_uppercase_tags_normalized() {
        let tree = Node::element(
            "DIV",
            vec![
                Node::text("a"),
                Node::element("P", vec![Node::text("b")]),
            ],
        );

        assert_eq!(extract_text(&tree), "a b ");
    }

    #[test]
    fn test_extract_deeply_nested_inline() {
        let tree = Node::element(
            "div",
            vec![Node::element(
                "span",
                vec![Node::element("em", vec![Node::text("deep")])],
            )],
        );

        assert_eq!(extract_text(&tree), "deep ");
    }
}
