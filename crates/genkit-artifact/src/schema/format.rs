//! Canonical proto3 rendering

use super::{Block, Element, Item, Rpc, SchemaDocument, Service, ServiceItem, Statement};

const INDENT: &str = "  ";

/// Renders a [`SchemaDocument`] in canonical layout
///
/// Top-level elements are separated by one blank line (consecutive imports
/// are kept together), bodies are indented two spaces and empty bodies
/// collapse to `{}`. Formatting a parsed document twice gives the same text.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaFormatter;

impl SchemaFormatter {
    /// Create a formatter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render the document
    #[must_use]
    pub fn format(&self, doc: &SchemaDocument) -> String {
        let mut out = String::new();
        let mut prev: Option<&Element> = None;

        for element in &doc.elements {
            if let Some(prev) = prev {
                let grouped = matches!(prev, Element::Import { .. }) && matches!(element, Element::Import { .. });
                if !grouped {
                    out.push('\n');
                }
            }
            write_element(&mut out, element);
            prev = Some(element);
        }
        out
    }
}

fn write_comments(out: &mut String, comments: &[String], depth: usize) {
    for line in comments {
        push_line(out, depth, line);
    }
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn with_inline(mut text: String, inline: Option<&String>) -> String {
    if let Some(comment) = inline {
        text.push(' ');
        text.push_str(comment);
    }
    text
}

fn write_element(out: &mut String, element: &Element) {
    match element {
        Element::Syntax { comments, value } => {
            write_comments(out, comments, 0);
            push_line(out, 0, &format!("syntax = \"{value}\";"));
        }
        Element::Package { comments, name } => {
            write_comments(out, comments, 0);
            push_line(out, 0, &format!("package {name};"));
        }
        Element::Import {
            comments,
            modifier,
            path,
        } => {
            write_comments(out, comments, 0);
            match modifier {
                Some(m) => push_line(out, 0, &format!("import {m} \"{path}\";")),
                None => push_line(out, 0, &format!("import \"{path}\";")),
            }
        }
        Element::Option(stmt) => write_statement(out, stmt, 0),
        Element::Service(service) => write_service(out, service),
        Element::Message(message) => {
            write_comments(out, &message.comments, 0);
            write_body(out, &format!("message {}", message.name), &message.items, None, 0);
        }
        Element::Other(block) => write_block(out, block, 0),
        Element::Comment(lines) => write_comments(out, lines, 0),
    }
}

fn write_service(out: &mut String, service: &Service) {
    write_comments(out, &service.comments, 0);
    if service.items.is_empty() {
        push_line(out, 0, &format!("service {} {{}}", service.name));
        return;
    }
    push_line(out, 0, &format!("service {} {{", service.name));
    for item in &service.items {
        match item {
            ServiceItem::Rpc(rpc) => write_rpc(out, rpc, 1),
            ServiceItem::Other(item) => write_item(out, item, 1),
        }
    }
    push_line(out, 0, "}");
}

fn write_rpc(out: &mut String, rpc: &Rpc, depth: usize) {
    write_comments(out, &rpc.comments, depth);
    let stream = |on: bool| if on { "stream " } else { "" };
    let head = format!(
        "rpc {} ({}{}) returns ({}{})",
        rpc.name,
        stream(rpc.request_stream),
        rpc.request,
        stream(rpc.response_stream),
        rpc.response
    );
    match &rpc.body {
        None => push_line(out, depth, &with_inline(format!("{head};"), rpc.inline.as_ref())),
        Some(items) => write_body(out, &head, items, rpc.inline.as_ref(), depth),
    }
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    write_comments(out, &block.comments, depth);
    write_body(out, &block.header.join(" "), &block.items, block.inline.as_ref(), depth);
}

fn write_body(out: &mut String, head: &str, items: &[Item], inline: Option<&String>, depth: usize) {
    if items.is_empty() {
        push_line(out, depth, &with_inline(format!("{head} {{}}"), inline));
        return;
    }
    push_line(out, depth, &format!("{head} {{"));
    for item in items {
        write_item(out, item, depth + 1);
    }
    push_line(out, depth, &with_inline("}".to_string(), inline));
}

fn write_item(out: &mut String, item: &Item, depth: usize) {
    match item {
        Item::Statement(stmt) => write_statement(out, stmt, depth),
        Item::Block(block) => write_block(out, block, depth),
        Item::Comment(lines) => write_comments(out, lines, depth),
    }
}

fn write_statement(out: &mut String, stmt: &Statement, depth: usize) {
    write_comments(out, &stmt.comments, depth);
    let text = format!("{};", join_tokens(&stmt.tokens));
    push_line(out, depth, &with_inline(text, stmt.inline.as_ref()));
}

/// Join tokens with proto spacing: `map<string, int32> tags = 3 [packed = true]`
fn join_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut prev: Option<&str> = None;
    for token in tokens {
        if let Some(p) = prev {
            let tight_before = matches!(token.as_str(), ")" | "]" | "," | ":" | ">" | "<");
            let tight_after = matches!(p, "(" | "[" | "<");
            if !tight_before && !tight_after {
                out.push(' ');
            }
        }
        out.push_str(token);
        prev = Some(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Message, SchemaParser};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_generated_layout() {
        let mut doc = SchemaDocument::new();
        doc.push(Element::Syntax {
            comments: vec![],
            value: "proto3".into(),
        });
        doc.push(Element::Package {
            comments: vec![],
            name: "pb".into(),
        });
        let mut svc = Service::new("User").with_comment("The User service definition.");
        svc.push_rpc(Rpc::new("Ping", "PingReq", "PingRsp"));
        doc.push(Element::Service(svc));
        doc.push(Element::Message(Message::new("PingReq")));
        doc.push(Element::Message(Message::new("PingRsp")));

        let expected = "syntax = \"proto3\";\n\npackage pb;\n\n// The User service definition.\nservice User {\n  rpc Ping (PingReq) returns (PingRsp);\n}\n\nmessage PingReq {}\n\nmessage PingRsp {}\n";
        assert_eq!(SchemaFormatter::new().format(&doc), expected);
    }

    #[test]
    fn token_spacing() {
        let tokens: Vec<String> = ["map", "<", "string", ",", "int32", ">", "tags", "=", "3", "[", "packed", "=", "true", "]"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        assert_eq!(join_tokens(&tokens), "map<string, int32> tags = 3 [packed = true]");
    }

    #[test]
    fn formatting_is_stable() {
        let src = "syntax=\"proto3\";\npackage pb;\nimport \"a.proto\";\nimport \"b.proto\";\n// doc\nmessage A {\n    int32 id = 1; // key\n  message B { string s = 1; }\n}\nenum E { X = 0; }\n";
        let once = SchemaFormatter::new().format(&SchemaParser::new().parse(src).unwrap());
        let twice = SchemaFormatter::new().format(&SchemaParser::new().parse(&once).unwrap());
        assert_eq!(once, twice);
        assert!(once.contains("import \"a.proto\";\nimport \"b.proto\";\n"));
        assert!(once.contains("  int32 id = 1; // key\n"));
        assert!(once.contains("  message B {\n    string s = 1;\n  }\n"));
    }
}
