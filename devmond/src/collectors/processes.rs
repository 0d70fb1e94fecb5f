//! Selects the development-stack processes worth showing and labels them.

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::ProcessConfig;
use crate::types::ProcessInfo;

/// One row of the host process table, as the collaborator reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProcess {
    pub pid: u32,
    pub comm: String,
    pub cmdline: String,
}

#[derive(Debug, Clone)]
pub struct ProcessRule {
    pattern: Regex,
    label: String,
}

impl ProcessRule {
    pub fn new(pattern: &str, label: impl Into<String>) -> Result<Self> {
        let pattern =
            Regex::new(pattern).with_context(|| format!("invalid process rule /{pattern}/"))?;
        Ok(Self {
            pattern,
            label: label.into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProcessClassifier {
    keywords: Vec<String>,
    exclude: Vec<String>,
    rules: Vec<ProcessRule>,
    fallback: String,
}

impl ProcessClassifier {
    pub fn from_config(cfg: &ProcessConfig) -> Result<Self> {
        let rules = cfg
            .rules
            .iter()
            .map(|rule| ProcessRule::new(&rule.pattern, rule.label.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            keywords: cfg.keywords.clone(),
            exclude: cfg.exclude.clone(),
            rules,
            fallback: cfg.fallback.clone(),
        })
    }

    /// Label for a command line; the first matching rule wins.
    pub fn describe(&self, cmdline: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(cmdline))
            .map(|rule| rule.label.as_str())
            .unwrap_or(&self.fallback)
    }

    pub fn is_watched(&self, cmdline: &str) -> bool {
        self.keywords.iter().any(|k| cmdline.contains(k.as_str()))
            && !self.exclude.iter().any(|e| cmdline.contains(e.as_str()))
    }

    pub fn classify(&self, table: &[RawProcess]) -> Vec<ProcessInfo> {
        table
            .iter()
            .filter(|p| self.is_watched(&p.cmdline))
            .map(|p| ProcessInfo {
                pid: p.pid,
                command_name: p.comm.clone(),
                full_cmdline: p.cmdline.clone(),
                description: self.describe(&p.cmdline).to_string(),
            })
            .collect()
    }
}
