//! A reference interpreter, running a computation on every replica at once.

use hlo_ir::{BinaryOp, Computation, Inst, InstructionData, ReplicaGroups, UnaryOp};
use std::collections::HashMap;

/// Flattened row-major contents of an array value, one per replica.
pub type Replicated = Vec<Vec<f64>>;

/// Deterministic, replica-dependent contents for parameter `number`.
pub fn parameter_data(replica: usize, number: usize, elements: u64) -> Vec<f64> {
    (0..elements)
        .map(|i| (replica * 10_000 + number * 1_000) as f64 + i as f64)
        .collect()
}

/// The replicas taking part in the same collective as `replica`.
fn group_of(groups: &ReplicaGroups, replicas: usize, replica: usize) -> Vec<usize> {
    if groups.is_empty() {
        return (0..replicas).collect();
    }
    groups
        .groups()
        .iter()
        .find(|group| group.contains(&(replica as u64)))
        .map(|group| group.iter().map(|&r| r as usize).collect())
        .unwrap_or_else(|| panic!("replica {replica} is in no group of {groups}"))
}

/// Evaluate the root of `comp` on `replicas` replicas.
pub fn evaluate(comp: &Computation, replicas: usize) -> Replicated {
    let mut values: HashMap<Inst, Replicated> = HashMap::new();
    for inst in comp.post_order() {
        let operands: Vec<&Replicated> = comp.operands(inst).iter().map(|op| &values[op]).collect();
        let value: Replicated = match comp.inst_data(inst) {
            InstructionData::Parameter { number } => (0..replicas)
                .map(|r| parameter_data(r, *number, comp.shape(inst).elements()))
                .collect(),
            InstructionData::Reshape | InstructionData::Bitcast => operands[0].clone(),
            InstructionData::Unary(op) => operands[0]
                .iter()
                .map(|data| {
                    data.iter()
                        .map(|&x| match op {
                            UnaryOp::Negate => -x,
                            UnaryOp::Abs => x.abs(),
                            UnaryOp::Copy => x,
                        })
                        .collect()
                })
                .collect(),
            InstructionData::Binary(op) => operands[0]
                .iter()
                .zip(operands[1])
                .map(|(a, b)| {
                    a.iter()
                        .zip(b)
                        .map(|(&x, &y)| match op {
                            BinaryOp::Add => x + y,
                            BinaryOp::Multiply => x * y,
                        })
                        .collect()
                })
                .collect(),
            InstructionData::AllReduce { replica_groups, .. } => (0..replicas)
                .map(|r| {
                    let group = group_of(replica_groups, replicas, r);
                    (0..operands[0][r].len())
                        .map(|i| group.iter().map(|&p| operands[0][p][i]).sum())
                        .collect()
                })
                .collect(),
            InstructionData::AllGather(gather) => {
                assert_eq!(operands.len(), 1, "only single-operand all-gathers evaluate");
                let dims = comp.shape(comp.operands(inst)[0]).dimensions();
                let dim = gather.gather_dimension;
                let outer: u64 = dims[..dim].iter().product();
                let inner: u64 = dims[dim..].iter().product();
                (0..replicas)
                    .map(|r| {
                        let group = group_of(&gather.replica_groups, replicas, r);
                        let mut out = Vec::new();
                        for o in 0..outer {
                            for &p in &group {
                                let start = (o * inner) as usize;
                                out.extend_from_slice(
                                    &operands[0][p][start..start + inner as usize],
                                );
                            }
                        }
                        out
                    })
                    .collect()
            }
        };
        values.insert(inst, value);
    }
    let root = comp.root().expect("computation has a root");
    values.remove(&root).expect("root was evaluated")
}
