//! Markdown documentation for the configured endpoints.
//!
//! Each route gets a heading, its auth requirement, status, a ready-to-run
//! curl command with path parameters filled in, and an example body.

use std::fmt::{self, Write};

use crate::config::{HttpMethod, MockConfig, RouteDefinition};
use crate::health::HEALTH_PATH;

/// Render the endpoint documentation for `config`.
///
/// `source` names the config file in the generated header.
pub fn render_endpoints(config: &MockConfig, source: &str) -> Result<String, fmt::Error> {
    let base_url = format!("http://localhost:{}", config.port());
    let mut out = String::new();

    writeln!(out, "# API Endpoints")?;
    writeln!(out)?;
    writeln!(out, "> Auto-generated from `{source}`")?;
    writeln!(out)?;
    writeln!(out, "**Base URL:** `{base_url}`")?;
    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(out)?;

    writeln!(out, "## Health Check")?;
    writeln!(out)?;
    writeln!(out, "**GET** `{HEALTH_PATH}`")?;
    writeln!(out)?;
    writeln!(out, "```bash")?;
    writeln!(out, "curl {base_url}{HEALTH_PATH}")?;
    writeln!(out, "```")?;
    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(out)?;

    for route in &config.routes {
        write_route(&mut out, route, &base_url)?;
    }

    Ok(out)
}

fn write_route(out: &mut String, route: &RouteDefinition, base_url: &str) -> fmt::Result {
    writeln!(out, "## {} {}", route.method, route.path)?;
    writeln!(out)?;

    if route.requires_auth {
        writeln!(
            out,
            "🔒 **Requires Authentication:** `{}` header",
            route.auth_header
        )?;
        writeln!(out)?;
    }

    writeln!(out, "**Response:** `{}`", route.response.status)?;
    writeln!(out)?;

    writeln!(out, "```bash")?;
    writeln!(out, "{}", curl_command(route, base_url))?;
    writeln!(out, "```")?;
    writeln!(out)?;

    let example_body = route
        .response
        .body
        .as_ref()
        .filter(|body| !body.is_null() && route.response.status != 204);
    if let Some(body) = example_body {
        if let Ok(pretty) = serde_json::to_string_pretty(body) {
            writeln!(out, "<details>")?;
            writeln!(out, "<summary>Example Response</summary>")?;
            writeln!(out)?;
            writeln!(out, "```json")?;
            writeln!(out, "{pretty}")?;
            writeln!(out, "```")?;
            writeln!(out, "</details>")?;
            writeln!(out)?;
        }
    }

    writeln!(out, "---")?;
    writeln!(out)
}

/// Build a curl invocation that satisfies the route.
pub fn curl_command(route: &RouteDefinition, base_url: &str) -> String {
    let mut parts = vec!["curl".to_string()];

    if !matches!(route.method, HttpMethod::Get | HttpMethod::Head) {
        parts.push(format!("-X {}", route.method));
    }

    if route.requires_auth {
        let value = if route.auth_header == "Authorization" {
            "Bearer YOUR_TOKEN_HERE"
        } else {
            "YOUR_TOKEN_HERE"
        };
        parts.push(format!("-H \"{}: {value}\"", route.auth_header));
    }

    if route.method == HttpMethod::Head {
        parts.push("-I".to_string());
    }

    parts.push(format!("{base_url}{}", example_path(&route.path)));
    parts.join(" ")
}

/// Substitute every `{name}` segment with a sample value.
pub fn example_path(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(example_value(&rest[start + 1..start + len]));
        rest = &rest[start + len + 1..];
    }

    out.push_str(rest);
    out
}

fn example_value(param: &str) -> &'static str {
    match param {
        "id" => "123",
        "userId" => "456",
        "productId" => "789",
        "orderId" => "order-123",
        "itemId" => "item-456",
        _ => "example-value",
    }
}
