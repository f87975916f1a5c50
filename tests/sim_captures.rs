//! Capture traces written by the in-process engine.

mod common;

use netlab::{ExperimentController, NetworkParameters, StreamTransport};
use packet_sim::PacketSim;

fn controller_in(dir: &std::path::Path) -> ExperimentController<PacketSim> {
    ExperimentController::new(
        PacketSim::new().with_capture_dir(dir),
        NetworkParameters::default(),
        StreamTransport::default(),
    )
    .expect("build controller")
}

#[test]
fn test_capture_uses_label_as_base_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut controller = controller_in(dir.path());
    controller
        .toggle_capture("probe-n1n6", "n1n6")
        .expect("toggle capture");
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    controller.run().expect("run");

    // n1n6 endpoint 0 is node 1's first device
    let trace = std::fs::read_to_string(dir.path().join("probe-n1n6-1-0.txt")).expect("trace");
    assert!(trace.lines().count() > 100);
    assert!(trace.lines().all(|l| l.contains("10.1.2.1:8080")));
}

#[test]
fn test_capture_is_promiscuous() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut controller = controller_in(dir.path());
    // node 6 forwards 4 -> 1 traffic onto n1n6 but does not own it
    controller
        .toggle_capture("transit", "n6n7")
        .expect("toggle capture");
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    controller.run().expect("run");

    let trace = std::fs::read_to_string(dir.path().join("transit-6-3.txt")).expect("trace");
    assert!(trace.lines().any(|l| l.contains("10.1.5.1:49153 > 10.1.2.1:8080")));
}

#[test]
fn test_uncaptured_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut controller = controller_in(dir.path());
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    controller.run().expect("run");

    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[test]
fn test_experiment_capture_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut controller = controller_in(dir.path());
    netlab::Experiment::Control
        .apply(&mut controller, "netlab")
        .expect("apply");
    controller.run().expect("run");

    for name in [
        "netlab-control-linux-reno-n1n6-1-0.txt",
        "netlab-control-linux-reno-n6n7-6-3.txt",
    ] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
}
