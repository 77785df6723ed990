//! Markdown 规则块提取
//!
//! 扫描信息串以 `graphrule` 开头的围栏代码块。块内先是
//! `name:` / `description:` / `priority:` 头部行，空行之后是规则体。

use log::debug;

/// 从 Markdown 中提取出的一个规则块
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBlock {
    pub name: String,
    pub description: String,
    pub priority: i64,
    /// 规则文本（头部之后的内容）
    pub body: String,
}

impl RuleBlock {
    fn from_fence_content(content: &str) -> Self {
        let mut name = String::new();
        let mut description = String::new();
        let mut priority = 0;
        let mut body_lines: Vec<&str> = Vec::new();
        let mut in_header = true;

        for line in content.lines() {
            if in_header {
                if line.trim().is_empty() {
                    in_header = false;
                    continue;
                }
                if let Some((key, value)) = line.split_once(':') {
                    match key.trim() {
                        "name" => {
                            name = value.trim().to_string();
                            continue;
                        }
                        "description" => {
                            description = value.trim().to_string();
                            continue;
                        }
                        "priority" => {
                            priority = value.trim().parse().unwrap_or_else(|_| {
                                debug!("unparseable priority '{}', using 0", value.trim());
                                0
                            });
                            continue;
                        }
                        _ => {}
                    }
                }
                // First non-header line starts the body even without a
                // separating blank line.
                in_header = false;
            }
            body_lines.push(line);
        }

        Self {
            name,
            description,
            priority,
            body: body_lines.join("\n").trim().to_string(),
        }
    }
}

/// 提取文档中的全部 `graphrule` 围栏块，按出现顺序返回
pub fn extract_rule_blocks(markdown: &str) -> Vec<RuleBlock> {
    let mut blocks = Vec::new();
    let mut fence: Option<(usize, Vec<String>)> = None; // (fence length, captured lines)

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        match &mut fence {
            None => {
                let backticks = trimmed.chars().take_while(|c| *c == '`').count();
                if backticks >= 3 {
                    let info = trimmed[backticks..].trim();
                    let first_word = info.split_whitespace().next().unwrap_or("");
                    if first_word == "graphrule" {
                        fence = Some((backticks, Vec::new()));
                    }
                }
            }
            Some((open_len, lines)) => {
                let backticks = trimmed.chars().take_while(|c| *c == '`').count();
                let closes = backticks >= *open_len && trimmed[backticks..].trim().is_empty();
                if closes {
                    blocks.push(RuleBlock::from_fence_content(&lines.join("\n")));
                    fence = None;
                } else {
                    lines.push(line.to_string());
                }
            }
        }
    }

    // 未闭合的围栏：按块处理，与宽松的 Markdown 渲染器一致
    if let Some((_, lines)) = fence {
        debug!("unterminated graphrule fence at end of document");
        blocks.push(RuleBlock::from_fence_content(&lines.join("\n")));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single_block() {
        let markdown = r#"
# Rules

```graphrule
name: ConnectPeople
description: Links people to tasks
priority: 5

MATCH (p:Person), (t:Task)
CREATE (p)-[:WORKS_ON]->(t)
```
"#;
        let blocks = extract_rule_blocks(markdown);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "ConnectPeople");
        assert_eq!(blocks[0].description, "Links people to tasks");
        assert_eq!(blocks[0].priority, 5);
        assert!(blocks[0].body.starts_with("MATCH"));
        assert!(blocks[0].body.contains("WORKS_ON"));
    }

    #[test]
    fn test_non_graphrule_fences_ignored() {
        let markdown = "```rust\nfn main() {}\n```\n```graphrule\nname: A\n\nCREATE (n:X)\n```";
        let blocks = extract_rule_blocks(markdown);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "A");
    }

    #[test]
    fn test_missing_headers_default() {
        let markdown = "```graphrule\nCREATE (n:X)\n```";
        let blocks = extract_rule_blocks(markdown);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "");
        assert_eq!(blocks[0].priority, 0);
        assert_eq!(blocks[0].body, "CREATE (n:X)");
    }

    #[test]
    fn test_multiple_blocks_in_document_order() {
        let markdown = "\
```graphrule
name: first
priority: 1

CREATE (a:A)
```
Some prose in between.
```graphrule
name: second
priority: 10

CREATE (b:B)
```";
        let blocks = extract_rule_blocks(markdown);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "first");
        assert_eq!(blocks[1].name, "second");
    }

    #[test]
    fn test_info_string_with_extra_words() {
        let markdown = "```graphrule v2\nname: X\n\nCREATE (n:X)\n```";
        assert_eq!(extract_rule_blocks(markdown).len(), 1);
    }

    #[test]
    fn test_unterminated_fence_still_yields_block() {
        let markdown = "```graphrule\nname: open\n\nCREATE (n:X)";
        let blocks = extract_rule_blocks(markdown);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "CREATE (n:X)");
    }
}
