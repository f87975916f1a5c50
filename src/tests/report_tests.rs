#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use packet_sim::test_util::raw_flow;
    use packet_sim::{FiveTuple, RawFlowCounters, SimTime};

    use crate::error::Error;
    use crate::report::{ReportSummary, RunReport, reduce, throughput_mbps};
    use crate::traffic::TransportKind;
    use crate::transport::StreamTransport;

    fn flow(flow_id: u32, protocol: u8) -> RawFlowCounters {
        let mut flow = raw_flow(
            flow_id,
            FiveTuple {
                source: Ipv4Addr::new(10, 1, 5, 1),
                destination: Ipv4Addr::new(10, 1, 2, 1),
                source_port: 49153,
                destination_port: 8080,
                protocol,
            },
        );
        flow.tx_bytes = 2_000_000;
        flow.rx_bytes = 1_048_576;
        flow.lost_packets = 3;
        flow.first_tx = Some(SimTime::from_millis(1_000));
        flow.last_rx = Some(SimTime::from_millis(9_000));
        flow
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput_mbps(1_048_576, 1.0, 9.0), 1.0);
        assert_eq!(throughput_mbps(1_048_576, 5.0, 5.0), 0.0);
        assert_eq!(throughput_mbps(1_048_576, 5.0, 0.0), 0.0);
        assert_eq!(throughput_mbps(0, 1.0, 2.0), 0.0);
    }

    #[test]
    fn test_reduce_labels_and_order() {
        let entries = reduce(&[flow(3, 17), flow(1, 6), flow(2, 6)]).unwrap();
        let ids: Vec<u32> = entries.iter().map(|e| e.flow_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(entries[0].label(), "TCP");
        assert_eq!(entries[2].label(), "UDP");
        assert_eq!(entries[2].kind, TransportKind::Datagram);
        assert_eq!(entries[0].throughput_mbps, 1.0);
        assert_eq!(entries[0].first_tx, 1.0);
        assert_eq!(entries[0].last_rx, 9.0);
    }

    #[test]
    fn test_reduce_without_receptions() {
        let mut raw = flow(1, 6);
        raw.rx_bytes = 0;
        raw.last_rx = None;
        let entry = &reduce(&[raw]).unwrap()[0];
        assert_eq!(entry.last_rx, 0.0);
        assert_eq!(entry.throughput_mbps, 0.0);
    }

    #[test]
    fn test_reduce_rejects_unknown_protocol() {
        let err = reduce(&[flow(1, 6), flow(2, 1)]).unwrap_err();
        assert!(matches!(err, Error::EngineFailure(_)), "{err}");
    }

    #[test]
    fn test_reduce_rejects_inconsistent_counters() {
        let mut raw = flow(1, 6);
        raw.rx_bytes = raw.tx_bytes + 1;
        assert!(matches!(reduce(&[raw]), Err(Error::EngineFailure(_))));
    }

    #[test]
    fn test_entry_display() {
        let entry = &reduce(&[flow(1, 6)]).unwrap()[0];
        let expected = "FlowID: 1 (TCP 10.1.5.1/49153 --> 10.1.2.1/8080)\n\
                        \x20 Tx Bytes: 2000000\n\
                        \x20 Rx Bytes: 1048576\n\
                        \x20 Lost Pkt: 3\n\
                        \x20 Flow active: 1.000000s - 9.000000s\n\
                        \x20 Throughput: 1.000000 Mbps";
        assert_eq!(entry.to_string(), expected);
    }

    #[test]
    fn test_summary() {
        let entries = reduce(&[flow(1, 6), flow(2, 17)]).unwrap();
        let summary = ReportSummary::from_entries(&entries);
        assert_eq!(summary.flows, 2);
        assert_eq!(summary.tx_bytes, 4_000_000);
        assert_eq!(summary.rx_bytes, 2_097_152);
        assert_eq!(summary.lost_packets, 6);
        assert_eq!(summary.mean_throughput_mbps, 1.0);

        assert_eq!(ReportSummary::from_entries(&[]), ReportSummary::default());
    }

    #[test]
    fn test_run_report_json() {
        let entries = reduce(&[flow(1, 6)]).unwrap();
        let report = RunReport::new("control", StreamTransport::Vegas, 42, entries);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["name"], "control");
        assert_eq!(json["transport"], "vegas");
        assert_eq!(json["summary"]["flows"], 1);
        assert_eq!(json["flows"][0]["kind"], "tcp");
        assert_eq!(json["flows"][0]["source"], "10.1.5.1:49153");
        assert_eq!(json["flows"][0]["lost_packets"], 3);
    }
}
