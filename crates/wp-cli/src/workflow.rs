//! Workflow run command: stream a run and answer its interrupts

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use wp_api_contract::{ResultRecord, WorkflowInterrupt, WorkflowParameters};
use wp_core::{
    DispatchConfig, EventDispatcher, EventObserver, WorkflowApi, DEFAULT_RESUME_DATA,
};
use wp_rest_client_mock::{Scenario, ScriptedClient};

use crate::connection::ConnectionArgs;

const RULE_WIDTH: usize = 50;

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Run a workflow in streaming mode, resuming on every interrupt
    Run(RunArgs),
}

impl WorkflowCommands {
    pub async fn run(self) -> Result<()> {
        match self {
            WorkflowCommands::Run(args) => args.run().await,
        }
    }
}

/// Arguments for `workflow run`
#[derive(Args)]
pub struct RunArgs {
    /// Workflow ID (the trailing number of the workflow's web link)
    #[arg(long)]
    pub workflow_id: String,

    /// Workflow input; VALUE is read as JSON when it parses, else as a string
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, serde_json::Value)>,

    /// Workflow inputs as one JSON object; --param entries override its keys
    #[arg(long, value_name = "JSON")]
    pub params_json: Option<String>,

    /// Payload sent with every resume call
    #[arg(long, default_value = DEFAULT_RESUME_DATA)]
    pub resume_data: String,

    /// Fail instead of resuming more than N times
    #[arg(long, value_name = "N")]
    pub max_interrupts: Option<usize>,

    /// Print the collected records as JSON when the run completes
    #[arg(long)]
    pub json: bool,

    /// Replay a scripted scenario file instead of calling the API
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub mock: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl RunArgs {
    /// Merge `--params-json` and `--param` into the run's inputs
    pub fn parameters(&self) -> Result<WorkflowParameters> {
        let mut parameters = match &self.params_json {
            Some(json) => {
                let value: serde_json::Value =
                    serde_json::from_str(json).context("--params-json is not valid JSON")?;
                match value {
                    serde_json::Value::Object(map) => map,
                    other => bail!("--params-json must be a JSON object, got {}", other),
                }
            }
            None => WorkflowParameters::new(),
        };

        for (key, value) in &self.params {
            parameters.insert(key.clone(), value.clone());
        }
        Ok(parameters)
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            resume_data: self.resume_data.clone(),
            max_interrupts: self.max_interrupts,
        }
    }

    fn client(&self) -> Result<(Box<dyn WorkflowApi>, String)> {
        match &self.mock {
            Some(path) => {
                let scenario = Scenario::from_file(path)
                    .with_context(|| format!("failed to load scenario {}", path.display()))?;
                let label = format!("mock:{}", scenario.name);
                Ok((Box::new(ScriptedClient::from_scenario(scenario)), label))
            }
            None => {
                let client = self.connection.client()?;
                let label = client.base_url().to_string();
                Ok((Box::new(client), label))
            }
        }
    }

    /// Run the workflow, printing progress and a final report
    ///
    /// Dispatch failures are reported on stdout and do not fail the command.
    pub async fn run(self) -> Result<()> {
        let parameters = self.parameters()?;
        let (client, api_label) = self.client()?;

        let rule = "=".repeat(RULE_WIDTH);
        println!("{}", rule);
        println!("Starting Coze Workflow Stream Test");
        println!("{}", rule);
        println!("Workflow ID: {}", self.workflow_id);
        println!("API Base: {}", api_label);
        println!("{}", rule);

        let dispatcher =
            EventDispatcher::new(client.as_ref(), self.workflow_id.clone(), self.dispatch_config());
        let mut console = ConsoleObserver;

        match dispatcher.run_with(&parameters, &mut console).await {
            Ok(records) => {
                info!("Run produced {} records", records.len());
                println!();
                println!("{}", rule);
                println!("Test completed successfully!");
                println!("Total events received: {}", records.len());
                println!("{}", RecordTally::from_records(&records));
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
            }
            Err(e) => {
                error!("Workflow {} failed: {}", self.workflow_id, e);
                println!();
                println!("Error occurred: {}: {}", e.kind_name(), e);
            }
        }
        Ok(())
    }
}

/// Prints one progress line per record as the run advances
struct ConsoleObserver;

impl EventObserver for ConsoleObserver {
    fn on_record(&mut self, record: &ResultRecord) {
        match record {
            ResultRecord::Message(message) => println!("got message: {}", message.content),
            ResultRecord::Error(error) => println!(
                "got error: [{}] {}",
                error.error_code, error.error_message
            ),
            ResultRecord::Interrupt(_) => {}
        }
    }

    fn on_resume(&mut self, _interrupt: &WorkflowInterrupt) {
        println!("got interrupt, resuming...");
    }
}

/// Per-kind record counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordTally {
    pub messages: usize,
    pub errors: usize,
    pub interrupts: usize,
}

impl RecordTally {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        records.iter().fold(Self::default(), |mut tally, record| {
            match record {
                ResultRecord::Message(_) => tally.messages += 1,
                ResultRecord::Error(_) => tally.errors += 1,
                ResultRecord::Interrupt(_) => tally.interrupts += 1,
            }
            tally
        })
    }
}

impl std::fmt::Display for RecordTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "messages: {}, errors: {}, interrupts: {}",
            self.messages, self.errors, self.interrupts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wp_api_contract::{WorkflowError, WorkflowMessage};

    #[test]
    fn test_parse_param_values() {
        assert_eq!(
            parse_param("question_img=https://example.com/q.png?a=b").unwrap(),
            (
                "question_img".to_string(),
                serde_json::json!("https://example.com/q.png?a=b")
            )
        );
        assert_eq!(parse_param("count=3").unwrap().1, serde_json::json!(3));
        assert_eq!(parse_param("flag=").unwrap().1, serde_json::json!(""));
        assert!(parse_param("no-equals").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_record_tally() {
        let records = vec![
            ResultRecord::Message(WorkflowMessage::text("a")),
            ResultRecord::Interrupt(WorkflowInterrupt::new("e1", 1)),
            ResultRecord::Message(WorkflowMessage::text("b")),
            ResultRecord::Error(WorkflowError::new(1, "x")),
        ];
        let tally = RecordTally::from_records(&records);

        assert_eq!(
            tally,
            RecordTally {
                messages: 2,
                errors: 1,
                interrupts: 1
            }
        );
        assert_eq!(tally.to_string(), "messages: 2, errors: 1, interrupts: 1");
    }
}
