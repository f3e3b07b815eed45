use anyhow::Result;
use serde::Serialize;
use tokcache_config::Config;

#[derive(Debug, Serialize)]
struct ModelRow<'a> {
    id: &'a str,
    label: &'a str,
    tokenizer_ref: Option<&'a str>,
    context_tokens: Option<usize>,
    chat: bool,
    fast: bool,
}

pub fn handle(config: &Config, json: bool) -> Result<()> {
    let rows = rows(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No models configured.");
        return Ok(());
    }

    println!("Models:");
    for row in rows {
        let mut markers = Vec::new();
        if row.chat {
            markers.push("chat");
        }
        if row.fast {
            markers.push("fast");
        }
        let markers = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(", "))
        };

        println!("  {} ({}){}", row.label, row.id, markers);
        println!("    Tokenizer: {}", row.tokenizer_ref.unwrap_or("(none)"));
        if let Some(tokens) = row.context_tokens {
            println!("    Context: {} tokens", tokens);
        }
    }

    Ok(())
}

fn rows(config: &Config) -> Vec<ModelRow<'_>> {
    config
        .models
        .iter()
        .map(|m| ModelRow {
            id: &m.id,
            label: m.display_name(),
            tokenizer_ref: m.tokenizer_ref.as_deref(),
            context_tokens: m.context_tokens,
            chat: config.chat_model.as_deref() == Some(m.id.as_str()),
            fast: config.fast_model.as_deref() == Some(m.id.as_str()),
        })
        .collect()
}
