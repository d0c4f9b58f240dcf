use tree::Node;

use crate::error::IoError;

/// Parses a Newick file's contents into a tree.
pub fn parse_newick(text: &str) -> Result<Node, IoError> {
    tree::parse(text).map_err(IoError::from)
}

/// Renders a tree back to Newick text.
pub fn format_newick(node: &Node) -> String {
    node.to_newick_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_tree() {
        let text = "(a:1,b:2):0;";
        let node = parse_newick(text).unwrap();
        assert_eq!(format_newick(&node), text);
    }
}
