//! Fault injection through the shared error model.

mod common;

use netlab::{Error, NetworkParameters};

#[test]
fn test_fault_causes_loss_across_seeds() {
    for seed in [1, 7, 42, 1234, 99_999] {
        let mut controller = common::controller_seeded(common::lossy(0.1), seed);
        controller.attach_fault("n1n6").expect("attach fault");
        controller
            .place_traffic(common::bottleneck_flow())
            .expect("place flow");
        let entries = controller.run().expect("run");

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(entry.lost_packets > 0, "seed {seed}: no loss");
        assert!(entry.rx_bytes > 0, "seed {seed}: nothing delivered");
        assert!(entry.rx_bytes < entry.tx_bytes);
        common::assert_report_invariants(&entries);
    }
}

#[test]
fn test_fault_off_path_does_not_drop() {
    let mut controller = common::controller(common::lossy(0.5));
    controller.attach_fault("n0n5").expect("attach fault");
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    let entries = controller.run().expect("run");

    assert_eq!(entries[0].lost_packets, 0);
}

#[test]
fn test_no_fault_without_error_rate() {
    let mut controller = common::controller(NetworkParameters::default());
    let err = controller.attach_fault("n1n6").unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");

    assert!(
        controller
            .topology()
            .link("n1n6")
            .expect("link")
            .fault()
            .is_none()
    );
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    let entries = controller.run().expect("run");
    assert_eq!(entries[0].lost_packets, 0);
}

#[test]
fn test_error_rate_without_attachment_is_lossless() {
    let mut controller = common::controller(common::lossy(0.3));
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    let entries = controller.run().expect("run");
    assert_eq!(entries[0].lost_packets, 0);
}
