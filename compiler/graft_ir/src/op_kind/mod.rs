//! Operator-kind tags.
//!
//! Each graph node and each pattern node carries an [`OpKind`]. The
//! reserved [`OpKind::Any`] wildcard matches every operator in a pattern
//! but never anchors a match.

use std::fmt;
use std::str::FromStr;

/// Operator kind of a graph or pattern node.
///
/// The set is closed. Primitive operators come first, followed by the
/// fused kinds that fusion passes substitute for matched subgraphs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    /// Wildcard: matches any operator, contributes no anchor.
    Any,

    // ── Primitive operators ─────────────────────────────────────────
    Abs,
    Add,
    AvgPool,
    BatchNormInference,
    BiasAdd,
    Concat,
    Convolution,
    Divide,
    Elu,
    Gelu,
    HardTanh,
    LayerNorm,
    MatMul,
    MaxPool,
    Multiply,
    ReLU,
    Reorder,
    Sigmoid,
    SoftMax,
    Sqrt,
    Square,
    Tanh,
    Transpose,

    // ── Fused operators ─────────────────────────────────────────────
    /// Convolution followed by ReLU.
    ConvRelu,
    /// Convolution with bias followed by ReLU.
    ConvBiasRelu,
    /// Inference batch norm followed by ReLU.
    BnRelu,
    /// MatMul followed by ReLU.
    MatMulRelu,
}

impl OpKind {
    /// Every kind, in declaration order.
    pub const ALL: [OpKind; 28] = [
        OpKind::Any,
        OpKind::Abs,
        OpKind::Add,
        OpKind::AvgPool,
        OpKind::BatchNormInference,
        OpKind::BiasAdd,
        OpKind::Concat,
        OpKind::Convolution,
        OpKind::Divide,
        OpKind::Elu,
        OpKind::Gelu,
        OpKind::HardTanh,
        OpKind::LayerNorm,
        OpKind::MatMul,
        OpKind::MaxPool,
        OpKind::Multiply,
        OpKind::ReLU,
        OpKind::Reorder,
        OpKind::Sigmoid,
        OpKind::SoftMax,
        OpKind::Sqrt,
        OpKind::Square,
        OpKind::Tanh,
        OpKind::Transpose,
        OpKind::ConvRelu,
        OpKind::ConvBiasRelu,
        OpKind::BnRelu,
        OpKind::MatMulRelu,
    ];

    /// Canonical name used in diagnostics and documents.
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Any => "Any",
            OpKind::Abs => "Abs",
            OpKind::Add => "Add",
            OpKind::AvgPool => "AvgPool",
            OpKind::BatchNormInference => "BatchNormInference",
            OpKind::BiasAdd => "BiasAdd",
            OpKind::Concat => "Concat",
            OpKind::Convolution => "Convolution",
            OpKind::Divide => "Divide",
            OpKind::Elu => "Elu",
            OpKind::Gelu => "Gelu",
            OpKind::HardTanh => "HardTanh",
            OpKind::LayerNorm => "LayerNorm",
            OpKind::MatMul => "MatMul",
            OpKind::MaxPool => "MaxPool",
            OpKind::Multiply => "Multiply",
            OpKind::ReLU => "ReLU",
            OpKind::Reorder => "Reorder",
            OpKind::Sigmoid => "Sigmoid",
            OpKind::SoftMax => "SoftMax",
            OpKind::Sqrt => "Sqrt",
            OpKind::Square => "Square",
            OpKind::Tanh => "Tanh",
            OpKind::Transpose => "Transpose",
            OpKind::ConvRelu => "ConvRelu",
            OpKind::ConvBiasRelu => "ConvBiasRelu",
            OpKind::BnRelu => "BnRelu",
            OpKind::MatMulRelu => "MatMulRelu",
        }
    }

    /// Whether this is the wildcard kind.
    #[inline]
    pub fn is_any(self) -> bool {
        self == OpKind::Any
    }

    /// Whether this kind is produced by a fusion pass.
    pub fn is_fused(self) -> bool {
        matches!(
            self,
            OpKind::ConvRelu | OpKind::ConvBiasRelu | OpKind::BnRelu | OpKind::MatMulRelu
        )
    }

    /// Whether a pattern node of kind `self` admits a graph node of `other`.
    ///
    /// `Any` admits everything; every other kind admits only itself.
    #[inline]
    pub fn admits(self, other: OpKind) -> bool {
        self.is_any() || self == other
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown operator name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownOpKind(pub String);

impl fmt::Display for UnknownOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownOpKind {}

impl FromStr for OpKind {
    type Err = UnknownOpKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownOpKind(s.to_owned()))
    }
}
