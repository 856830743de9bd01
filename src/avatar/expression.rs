//! Facial expression vocabulary and per-model expression state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::AvatarModel;
use crate::error::ExpressionError;

/// Poses reachable through the expression command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionPreset {
    Joy,
    Sad,
    Angry,
    Surprised,
}

impl ExpressionPreset {
    pub const ALL: [ExpressionPreset; 4] = [
        ExpressionPreset::Joy,
        ExpressionPreset::Sad,
        ExpressionPreset::Angry,
        ExpressionPreset::Surprised,
    ];

    /// Map an external command to a pose (case-insensitive).
    ///
    /// `happy` and `joy` both select [`ExpressionPreset::Joy`]; anything else
    /// outside the vocabulary maps to `None`.
    pub fn from_command(command: &str) -> Option<Self> {
        match command.to_lowercase().as_str() {
            "happy" | "joy" => Some(Self::Joy),
            "sad" => Some(Self::Sad),
            "angry" => Some(Self::Angry),
            "surprised" => Some(Self::Surprised),
            _ => None,
        }
    }

    /// Expression name on the model.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
        }
    }
}

impl std::fmt::Display for ExpressionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps an expression to one morph target of one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionBind {
    /// Mesh index within the model
    pub mesh: usize,
    /// Morph target index within that mesh
    pub morph_index: usize,
    /// Weight applied at full expression strength
    pub weight: f32,
}

/// Definition of one named expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionDef {
    pub binds: Vec<ExpressionBind>,
    /// Binary expressions snap to 0 or 1
    pub is_binary: bool,
}

/// Expression weights of one loaded model.
#[derive(Debug, Clone, Default)]
pub struct ExpressionManager {
    defs: HashMap<String, ExpressionDef>,
    values: HashMap<String, f32>,
}

impl ExpressionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an expression the model can show.
    pub fn define(&mut self, name: &str, def: ExpressionDef) {
        self.defs.insert(name.to_string(), def);
    }

    pub fn has(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// All defined expression names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(|s| s.as_str())
    }

    /// Set an expression weight (clamped to `0.0..=1.0`).
    ///
    /// Returns `false` if the model does not define `name`.
    pub fn set_value(&mut self, name: &str, value: f32) -> bool {
        if !self.defs.contains_key(name) {
            return false;
        }
        let value = value.clamp(0.0, 1.0);
        if value > 0.0 {
            self.values.insert(name.to_string(), value);
        } else {
            self.values.remove(name);
        }
        true
    }

    pub fn value(&self, name: &str) -> f32 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Reset every expression weight to zero.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Names of expressions with a non-zero weight, sorted.
    pub fn active(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve active expressions into morph weights.
    ///
    /// `weights[mesh][target]` is overwritten; binds pointing outside it are skipped.
    pub fn resolve_morph_weights(&self, weights: &mut [Vec<f32>]) {
        for mesh in weights.iter_mut() {
            mesh.iter_mut().for_each(|w| *w = 0.0);
        }

        for (name, &value) in &self.values {
            let Some(def) = self.defs.get(name) else {
                continue;
            };
            let value = if def.is_binary {
                if value > 0.5 {
                    1.0
                } else {
                    0.0
                }
            } else {
                value
            };

            for bind in &def.binds {
                if let Some(slot) = weights
                    .get_mut(bind.mesh)
                    .and_then(|m| m.get_mut(bind.morph_index))
                {
                    *slot = (*slot + value * bind.weight).clamp(0.0, 1.0);
                }
            }
        }
    }
}

/// Apply an expression command to a model.
///
/// Clears all active expressions first so poses never blend. Commands outside
/// the vocabulary leave the model with no active pose and return `Ok(None)`.
pub fn set_expression<M: AvatarModel + ?Sized>(
    model: &mut M,
    command: &str,
) -> Result<Option<ExpressionPreset>, ExpressionError> {
    let manager = model.expressions_mut().ok_or(ExpressionError::Unavailable)?;
    manager.clear();

    let Some(preset) = ExpressionPreset::from_command(command) else {
        return Ok(None);
    };

    if !manager.set_value(preset.name(), 1.0) {
        return Err(ExpressionError::MissingPreset(preset.name().to_string()));
    }

    Ok(Some(preset))
}
