use crate::evaluator::evaluate;
use crate::f32;
use hlo_ir::{
    ChannelId, ComputationBuilder, InstructionData, Module, ReplicaGroups, UnaryOp, verify_module,
};
use hlo_spmd::{CanonicalizeAllGatherForCse, is_degenerate_reshape};
use proptest::prelude::*;
use proptest::sample::Index;

/// An all-gather of a parameter seen through a chain of reshapes adding unit dimensions.
#[derive(Debug, Clone)]
struct Case {
    base: Vec<u64>,
    insertions: Vec<Index>,
    gather_dimension: Index,
    participants: u64,
    channel_id: Option<u64>,
}

fn case() -> impl Strategy<Value = Case> {
    (
        prop::collection::vec(1u64..=4, 1..=3),
        prop::collection::vec(any::<Index>(), 0..=3),
        any::<Index>(),
        1u64..=3,
        prop::option::of(1u64..=5),
    )
        .prop_map(
            |(base, insertions, gather_dimension, participants, channel_id)| Case {
                base,
                insertions,
                gather_dimension,
                participants,
                channel_id,
            },
        )
}

fn build(case: &Case) -> Module {
    let mut b = ComputationBuilder::new("main");
    let mut dims = case.base.clone();
    let mut data = b.parameter(0, f32(&dims)).unwrap();
    for (i, at) in case.insertions.iter().enumerate() {
        dims.insert(at.index(dims.len() + 1), 1);
        data = if i % 2 == 0 {
            b.reshape(data, f32(&dims)).unwrap()
        } else {
            b.bitcast(data, f32(&dims)).unwrap()
        };
        assert!(is_degenerate_reshape(b.computation(), data));
    }

    let dim = case.gather_dimension.index(dims.len());
    let mut gathered = dims.clone();
    gathered[dim] *= case.participants;
    let ag = b
        .all_gather(
            data,
            f32(&gathered),
            dim,
            ReplicaGroups::new(vec![(0..case.participants).collect()]),
            case.channel_id.map(ChannelId::new),
        )
        .unwrap();
    let root = b.unary(UnaryOp::Negate, ag).unwrap();
    let mut module = Module::new("prop");
    module.add_computation(b.finish(root).unwrap());
    module
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn canonicalization_preserves_values(case in case()) {
        let mut module = build(&case);
        let replicas = case.participants as usize;
        let entry = module.entry().unwrap();
        let expected = evaluate(module.computation(entry), replicas);
        let before = module.display().to_string();
        let old_max = module.channel_ids().max();

        let changed = CanonicalizeAllGatherForCse::new().run(&mut module).unwrap();
        prop_assert!(verify_module(&module).is_ok(), "{}", module.display());
        prop_assert_eq!(evaluate(module.computation(entry), replicas), expected);

        if case.insertions.is_empty() {
            prop_assert!(!changed);
        }
        if !changed {
            prop_assert_eq!(module.display().to_string(), before);
            return Ok(());
        }

        // The all-gather now reads the parameter, and only the parameter feeds it.
        let comp = module.computation(entry);
        let param = comp.parameter(0).unwrap();
        let ags: Vec<_> = comp
            .instructions()
            .filter(|&inst| comp.inst_data(inst).as_all_gather().is_some())
            .collect();
        prop_assert_eq!(ags.len(), 1);
        prop_assert_eq!(comp.operands(ags[0]), &[param]);
        prop_assert_eq!(comp.len(), 4);
        let no_bitcast = comp
            .instructions()
            .all(|inst| !matches!(comp.inst_data(inst), InstructionData::Bitcast));
        prop_assert!(no_bitcast);

        let new_channel = comp.inst_data(ags[0]).channel_id();
        prop_assert_eq!(new_channel.is_some(), case.channel_id.is_some());
        if let (Some(new), Some(old)) = (new_channel, old_max) {
            prop_assert!(new > old);
        }

        let once = module.display().to_string();
        prop_assert!(!CanonicalizeAllGatherForCse::new().run(&mut module).unwrap());
        prop_assert_eq!(module.display().to_string(), once);
    }
}
