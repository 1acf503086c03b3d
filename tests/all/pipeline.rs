use crate::{f32, init_logging};
use hlo_ir::{ChannelId, ComputationBuilder, InstructionData, Module, ReplicaGroups};
use hlo_spmd::settings::{self, Configurable, Flags};
use hlo_spmd::timing::{self, Pass};
use hlo_spmd::{CanonicalizeAllGatherForCse, PassError, PassPipeline};

fn gather_module(channel_id: Option<ChannelId>) -> Module {
    let mut b = ComputationBuilder::new("main");
    let p = b.parameter(0, f32(&[8])).unwrap();
    let r = b.reshape(p, f32(&[1, 8])).unwrap();
    let ag = b
        .all_gather(r, f32(&[1, 16]), 1, ReplicaGroups::default(), channel_id)
        .unwrap();
    let mut module = Module::new("m");
    module.add_computation(b.finish(ag).unwrap());
    module
}

#[test]
fn pipeline_runs_and_times_the_pass() {
    init_logging();
    drop(timing::take_current());

    let mut b = settings::builder();
    b.enable("dump_ir").unwrap();
    let mut pipeline = PassPipeline::new(Flags::new(b));
    pipeline.add_pass(CanonicalizeAllGatherForCse::new());

    let mut module = gather_module(Some(ChannelId::new(1)));
    assert!(pipeline.run(&mut module).unwrap());
    assert!(!pipeline.run(&mut module).unwrap());

    let times = timing::take_current();
    assert_eq!(times.runs(Pass::Pipeline), 2);
    assert_eq!(times.runs(Pass::CanonicalizeAllGather), 2);
    // Verified on entry to both runs, and after the first one changed the module.
    assert_eq!(times.runs(Pass::VerifyModule), 3);
    assert!(times.get(Pass::Pipeline) >= times.get(Pass::CanonicalizeAllGather));
    let table = times.to_string();
    assert!(table.contains("Pass pipeline"), "{table}");
}

#[test]
fn verifier_catches_duplicate_channel_ids() {
    let mut module = gather_module(Some(ChannelId::new(1)));
    let mut other = ComputationBuilder::new("other");
    let p = other.parameter(0, f32(&[2])).unwrap();
    let reduce = other
        .all_reduce(p, ReplicaGroups::default(), Some(ChannelId::new(1)))
        .unwrap();
    module.add_computation(other.finish(reduce).unwrap());

    let mut pipeline = PassPipeline::new(Flags::default());
    pipeline.add_pass(CanonicalizeAllGatherForCse::new());
    let before = module.display().to_string();
    match pipeline.run(&mut module) {
        Err(PassError::Verifier(errors)) => {
            assert!(errors.to_string().contains("channel_id=1"), "{errors}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    // Verification happens before the pass runs.
    assert_eq!(module.display().to_string(), before);
}

#[test]
fn rewritten_module_prints_canonical_form() {
    let mut module = gather_module(None);
    let mut pipeline = PassPipeline::new(Flags::default());
    pipeline.add_pass(CanonicalizeAllGatherForCse::new());
    assert!(pipeline.run(&mut module).unwrap());

    assert_eq!(
        module.display().to_string(),
        "module m, entry=main\n\
         \n\
         computation main {\n  \
         inst0 = f32[8] parameter(0)\n  \
         inst3 = f32[16] all-gather(inst0), dimensions={0}, replica_groups={}\n  \
         ROOT inst4 = f32[1,16] reshape(inst3)\n\
         }\n"
    );
    let comp = module.computation(module.entry().unwrap());
    assert!(matches!(
        comp.inst_data(comp.root().unwrap()),
        InstructionData::Reshape
    ));
}

#[test]
fn empty_gather_of_producer_is_a_no_op() {
    let mut b = ComputationBuilder::new("main");
    let p = b.parameter(0, f32(&[0])).unwrap();
    let ag = b
        .all_gather(p, f32(&[0]), 0, ReplicaGroups::default(), None)
        .unwrap();
    let mut module = Module::new("m");
    module.add_computation(b.finish(ag).unwrap());
    let before = module.display().to_string();

    let mut pipeline = PassPipeline::new(Flags::default());
    pipeline.add_pass(CanonicalizeAllGatherForCse::new());
    assert!(!pipeline.run(&mut module).unwrap());
    assert_eq!(module.display().to_string(), before);
}
