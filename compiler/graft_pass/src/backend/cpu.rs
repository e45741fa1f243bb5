//! CPU backend fusion passes.
//!
//! Priorities order the fusions so that larger patterns claim nodes before
//! their sub-patterns: `conv_bias_relu_fusion` must see a conv→bias→relu
//! chain before `conv_relu_fusion` can take the conv→relu tail.

use std::sync::Arc;

use graft_ir::{Graph, GraphNode, OpKind};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::RegisterFn;
use crate::pattern::RequirementFn;
use crate::{
    register_analysis_pass, register_transformation_pass, Pattern, PatternError, PassRegistry,
    RegistryError,
};

/// Backend name.
pub const BACKEND: &str = "cpu";

/// Registration table, in registration order.
pub const PASSES: &[RegisterFn] = &[
    conv_bn_fusion,
    conv_bias_relu_fusion,
    conv_relu_fusion,
    matmul_relu_fusion,
    bn_relu_fusion,
    op_census,
];

/// Convolution → inference batch norm, folded into the convolution.
fn conv_bn_fusion(registry: &mut PassRegistry) -> Result<(), RegistryError> {
    register_transformation_pass!(registry, cpu, conv_bn_fusion)?
        .set_priority(9.8)
        .add_pattern(|pattern| {
            let conv = pattern.create_node(OpKind::Convolution);
            pattern.append_node(OpKind::BatchNormInference, &[conv])?;
            Ok(())
        })
        .set_opt_pattern(single(OpKind::Convolution));
    Ok(())
}

/// Convolution with bias → ReLU.
///
/// The bias shows up either as an explicit `BiasAdd` or as the
/// convolution's third input.
fn conv_bias_relu_fusion(registry: &mut PassRegistry) -> Result<(), RegistryError> {
    register_transformation_pass!(registry, cpu, conv_bias_relu_fusion)?
        .set_priority(9.7)
        .add_pattern(|pattern| {
            let conv = pattern.create_node(OpKind::Convolution);
            let bias = pattern.append_node(OpKind::BiasAdd, &[conv])?;
            pattern.append_node(OpKind::ReLU, &[bias])?;
            Ok(())
        })
        .add_pattern(|pattern| {
            let conv = pattern.create_node(OpKind::Convolution);
            pattern.append_requirement(conv, has_inputs(3))?;
            pattern.append_node(OpKind::ReLU, &[conv])?;
            Ok(())
        })
        .set_opt_pattern(single(OpKind::ConvBiasRelu));
    Ok(())
}

/// Convolution → ReLU.
fn conv_relu_fusion(registry: &mut PassRegistry) -> Result<(), RegistryError> {
    register_transformation_pass!(registry, cpu, conv_relu_fusion)?
        .set_priority(9.0)
        .add_pattern(|pattern| {
            let conv = pattern.create_node(OpKind::Convolution);
            pattern.append_node(OpKind::ReLU, &[conv])?;
            Ok(())
        })
        .set_opt_pattern(single(OpKind::ConvRelu));
    Ok(())
}

/// MatMul → ReLU.
fn matmul_relu_fusion(registry: &mut PassRegistry) -> Result<(), RegistryError> {
    register_transformation_pass!(registry, cpu, matmul_relu_fusion)?
        .set_priority(8.9)
        .add_pattern(|pattern| {
            let matmul = pattern.create_node(OpKind::MatMul);
            pattern.append_node(OpKind::ReLU, &[matmul])?;
            Ok(())
        })
        .set_opt_pattern(single(OpKind::MatMulRelu));
    Ok(())
}

/// Inference batch norm → ReLU.
fn bn_relu_fusion(registry: &mut PassRegistry) -> Result<(), RegistryError> {
    register_transformation_pass!(registry, cpu, bn_relu_fusion)?
        .set_priority(8.8)
        .add_pattern(|pattern| {
            let bn = pattern.create_node(OpKind::BatchNormInference);
            pattern.append_node(OpKind::ReLU, &[bn])?;
            Ok(())
        })
        .set_opt_pattern(single(OpKind::BnRelu));
    Ok(())
}

/// Logs an operator histogram of the graph as it reaches this point.
fn op_census(registry: &mut PassRegistry) -> Result<(), RegistryError> {
    register_analysis_pass!(registry, cpu, op_census)?
        .set_priority(1.0)
        .add_analysis(|graph| {
            let histogram = op_histogram(graph);
            debug!(
                nodes = graph.node_count(),
                kinds = histogram.len(),
                fused = histogram
                    .iter()
                    .filter(|(kind, _)| kind.is_fused())
                    .map(|(_, count)| count)
                    .sum::<usize>(),
                "op census"
            );
        });
    Ok(())
}

/// Count live nodes per operator kind.
pub fn op_histogram(graph: &dyn Graph) -> FxHashMap<OpKind, usize> {
    let mut histogram = FxHashMap::default();
    for node in graph.nodes() {
        *histogram.entry(node.op_kind()).or_insert(0) += 1;
    }
    histogram
}

/// Optimized pattern consisting of one fused node.
fn single(kind: OpKind) -> impl Fn(&mut Pattern) -> Result<(), PatternError> + Send + Sync {
    move |pattern| {
        pattern.create_node(kind);
        Ok(())
    }
}

/// Requirement: the candidate has exactly `count` inputs.
fn has_inputs(count: usize) -> RequirementFn {
    Arc::new(move |node: &dyn GraphNode| node.input_count() == count)
}
