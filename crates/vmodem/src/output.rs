use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vmodem_frame::{AtResponse, AtResponsePtr};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    kind: &'static str,
    #[serde(rename = "final")]
    is_final: bool,
    response: &'a AtResponse,
    timestamp: String,
}

/// Print one response as soon as it arrives.
pub fn print_response(response: &AtResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", json_line(response)),
        OutputFormat::Table => {
            let mut table = response_table();
            table.add_row(table_row(response));
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", pretty_line(response)),
        OutputFormat::Raw => println!("{response}"),
    }
}

/// Print a batch of responses; tables get a single table for the batch.
pub fn print_responses(responses: &[AtResponsePtr], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if responses.is_empty() {
                return;
            }
            let mut table = response_table();
            for response in responses {
                table.add_row(table_row(response));
            }
            println!("{table}");
        }
        _ => {
            for response in responses {
                print_response(response, format);
            }
        }
    }
}

fn json_line(response: &AtResponse) -> String {
    let out = ResponseOutput {
        kind: response.what(),
        is_final: response.is_final(),
        response,
        timestamp: now_unix_seconds(),
    };
    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
}

fn pretty_line(response: &AtResponse) -> String {
    format!(
        "kind={} final={} detail={}",
        response.what(),
        response.is_final(),
        detail(response)
    )
}

fn response_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["KIND", "FINAL", "DETAIL"]);
    table
}

fn table_row(response: &AtResponse) -> Vec<String> {
    vec![
        response.what().to_string(),
        response.is_final().to_string(),
        detail(response),
    ]
}

/// Payload of the response without the variant wrapper.
fn detail(response: &AtResponse) -> String {
    match response {
        AtResponse::Ok | AtResponse::Error | AtResponse::Ring | AtResponse::SmsPrompt => {
            String::new()
        }
        AtResponse::Cusatend | AtResponse::Cchc => String::new(),
        AtResponse::ParseError(kind) => format!("unparseable {kind} payload"),
        AtResponse::Text(text) => text.clone(),
        other => {
            let debug = format!("{other:?}");
            match debug.split_once('(') {
                Some((_, inner)) => inner.strip_suffix(')').unwrap_or(inner).to_string(),
                None => debug,
            }
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use vmodem_frame::response::{Cfun, RadioState};
    use vmodem_frame::ResponseKind;

    use super::*;

    #[test]
    fn json_line_carries_kind_and_payload() {
        let response = AtResponse::Cfun(Cfun {
            state: RadioState::On,
        });
        let value: serde_json::Value = serde_json::from_str(&json_line(&response)).unwrap();
        assert_eq!(value["kind"], "CFUN");
        assert_eq!(value["final"], false);
        assert_eq!(value["response"]["Cfun"]["state"], "On");
    }

    #[test]
    fn json_line_for_unit_responses() {
        let value: serde_json::Value = serde_json::from_str(&json_line(&AtResponse::Ok)).unwrap();
        assert_eq!(value["kind"], "OK");
        assert_eq!(value["final"], true);
        assert_eq!(value["response"], "Ok");
    }

    #[test]
    fn detail_strips_variant_wrapper() {
        let response = AtResponse::Cfun(Cfun {
            state: RadioState::Off,
        });
        assert_eq!(detail(&response), "Cfun { state: Off }");
        assert_eq!(detail(&AtResponse::Text("310260000000001".into())), "310260000000001");
        assert_eq!(
            detail(&AtResponse::ParseError(ResponseKind::Csq)),
            "unparseable CSQ payload"
        );
        assert_eq!(detail(&AtResponse::Ring), "");
    }

    #[test]
    fn pretty_line_format() {
        assert_eq!(pretty_line(&AtResponse::Ok), "kind=OK final=true detail=");
    }
}
