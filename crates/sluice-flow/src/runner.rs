//! Symbol sequence runners.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use derive_builder::Builder;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::TRACING_TARGET;
use crate::error::{FlowError, FlowResult};
use crate::symbol::Symbol;
use crate::table::InstructionKey;
use sluice_core::Value;

/// Configuration for symbol sequence runners.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RunnerConfig {
    /// Timeout for one full run of a symbol sequence.
    #[builder(default = "Duration::from_secs(3600)")]
    pub timeout: Duration,
}

impl RunnerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err("timeout must be non-zero".into());
            }
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Executor of compiled symbol sequences.
///
/// A runner owns scheduling and invocation order, under the instruction
/// contract: arguments are fully evaluated before an instruction is
/// invoked, whatever parallelism is exploited respects the symbol
/// dependency DAG, and each instruction is invoked exactly once.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runs a symbol sequence to completion, returning the terminal value.
    async fn run(&self, symbols: &[Symbol]) -> FlowResult<Value>;
}

/// Minimal in-process runner.
///
/// Derives its own dependency order from the symbols and invokes them one
/// by one, memoizing every instruction result by its bookkeeping key.
pub struct Interpreter {
    config: RunnerConfig,
}

impl Interpreter {
    /// Creates an interpreter with the given configuration.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Creates an interpreter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RunnerConfig::default())
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    async fn evaluate(&self, symbols: &[Symbol]) -> FlowResult<Value> {
        if symbols.is_empty() {
            return Ok(Value::Null);
        }

        let mut graph = DiGraph::<usize, ()>::new();
        let mut indices = HashMap::new();
        for (position, symbol) in symbols.iter().enumerate() {
            indices.insert(symbol.key, graph.add_node(position));
        }

        let mut referenced = HashSet::new();
        for symbol in symbols {
            for argument in &symbol.arguments {
                let from = indices
                    .get(argument)
                    .ok_or_else(|| FlowError::Internal(format!(
                        "argument {argument} is not part of the sequence"
                    )))?;
                graph.add_edge(*from, indices[&symbol.key], ());
                referenced.insert(*argument);
            }
        }

        let terminals: Vec<&Symbol> = symbols
            .iter()
            .filter(|symbol| !referenced.contains(&symbol.key))
            .collect();
        let terminal = match terminals.as_slice() {
            [terminal] => terminal.key,
            other => {
                return Err(FlowError::MultipleOutputs {
                    count: other.len(),
                });
            }
        };

        let order = toposort(&graph, None).map_err(|_| FlowError::CyclicFlow)?;

        let mut results: HashMap<InstructionKey, Value> = HashMap::new();
        for index in order {
            let symbol = &symbols[graph[index]];
            let mut args = Vec::with_capacity(symbol.arguments.len());
            for argument in &symbol.arguments {
                let value = results.get(argument).cloned().ok_or_else(|| {
                    FlowError::Internal(format!("argument {argument} evaluated out of order"))
                })?;
                args.push(value);
            }

            tracing::trace!(
                target: TRACING_TARGET,
                instruction = symbol.instruction.mnemonic(),
                key = %symbol.key,
                args = args.len(),
                "Invoking instruction"
            );

            let value = symbol.instruction.invoke(args).await?;
            results.insert(symbol.key, value);
        }

        results
            .remove(&terminal)
            .ok_or_else(|| FlowError::Internal("terminal instruction never evaluated".into()))
    }
}

#[async_trait]
impl Runner for Interpreter {
    async fn run(&self, symbols: &[Symbol]) -> FlowResult<Value> {
        tokio::time::timeout(self.config.timeout, self.evaluate(symbols))
            .await
            .map_err(|_| FlowError::Timeout)?
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .finish()
    }
}
