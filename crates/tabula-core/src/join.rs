//! Join specifications and their wire format.
//!
//! A [`JoinSpec`] is the validated client-side model: a primary table and one
//! equality condition per joined table. [`JoinRequest`] is the JSON body the
//! backend accepts, in which every clause is a *group* of conditions. Clients
//! always send singleton groups; the backend ANDs the members of larger ones.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Conditions ──────────────────────────────────────────────────────────────

/// `left_table.left_column = right_table.right_column`.
///
/// Encoded on the wire as a four-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 4]", into = "[String; 4]")]
pub struct JoinCondition {
  pub left_table:   String,
  pub left_column:  String,
  pub right_table:  String,
  pub right_column: String,
}

impl From<[String; 4]> for JoinCondition {
  fn from([left_table, left_column, right_table, right_column]: [String; 4]) -> Self {
    Self { left_table, left_column, right_table, right_column }
  }
}

impl From<JoinCondition> for [String; 4] {
  fn from(c: JoinCondition) -> Self {
    [c.left_table, c.left_column, c.right_table, c.right_column]
  }
}

/// One joined table and the condition it is joined on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
  pub secondary_table: String,
  pub condition:       JoinCondition,
}

// ─── Spec ────────────────────────────────────────────────────────────────────

/// A primary table plus between 1 and `total_tables - 1` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
  primary_table: String,
  clauses:       Vec<JoinClause>,
}

impl JoinSpec {
  /// Build a spec, rejecting a clause count outside `1..=total_tables - 1`.
  pub fn new(
    primary_table: impl Into<String>,
    clauses: Vec<JoinClause>,
    total_tables: usize,
  ) -> Result<Self> {
    let max = total_tables.saturating_sub(1);
    if clauses.is_empty() || clauses.len() > max {
      return Err(Error::JoinCardinality {
        count: clauses.len(),
        max,
        total_tables,
      });
    }
    Ok(Self { primary_table: primary_table.into(), clauses })
  }

  pub fn primary_table(&self) -> &str { &self.primary_table }

  pub fn clauses(&self) -> &[JoinClause] { &self.clauses }

  pub fn to_request(&self) -> JoinRequest {
    JoinRequest {
      primary_table:    self.primary_table.clone(),
      secondary_tables: self
        .clauses
        .iter()
        .map(|c| c.secondary_table.clone())
        .collect(),
      clauses:          self
        .clauses
        .iter()
        .map(|c| vec![c.condition.clone()])
        .collect(),
    }
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

/// JSON body of the join call.
///
/// `clauses[i]` holds the conditions for `secondary_tables[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
  pub primary_table:    String,
  pub secondary_tables: Vec<String>,
  pub clauses:          Vec<Vec<JoinCondition>>,
}

impl JoinRequest {
  /// Structural checks that need no catalogue access.
  pub fn validate(&self) -> Result<()> {
    if self.secondary_tables.len() != self.clauses.len() {
      return Err(Error::MalformedJoin(format!(
        "{} secondary tables but {} clause groups",
        self.secondary_tables.len(),
        self.clauses.len()
      )));
    }
    if let Some(i) = self.clauses.iter().position(Vec::is_empty) {
      return Err(Error::MalformedJoin(format!(
        "clause group {i} has no join condition"
      )));
    }
    Ok(())
  }
}
