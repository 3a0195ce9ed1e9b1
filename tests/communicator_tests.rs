use quad_sieve::algs::communicator::{CommTag, Communicator, NoComm, RayonComm, Wait};
use quad_sieve::quad_error::QuadError;
use serial_test::serial;

#[test]
#[serial]
fn rayon_round_trip() {
    let tag = CommTag(0x1000);
    let c0 = RayonComm::new(0, 2);
    let c1 = RayonComm::new(1, 2);

    let msg = b"hello";
    let _s = c0.isend(1, tag.base(), msg);

    let mut buf = [0u8; 5];
    let h = c1.irecv(0, tag.base(), &mut buf);
    let got = h.wait().unwrap();
    assert_eq!(&got, msg);
}

#[test]
#[serial]
fn rayon_fifo_order() {
    let tag = CommTag(0x1001);
    let c0 = RayonComm::new(0, 2);
    let c1 = RayonComm::new(1, 2);

    for i in 0..10u8 {
        let _ = c0.isend(1, tag.base(), &[i]);
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let mut b = [0u8; 1];
        let h = c1.irecv(0, tag.base(), &mut b);
        out.push(h.wait().unwrap()[0]);
    }
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
#[serial]
fn truncation_is_ok() {
    let tag = CommTag(0x1002);
    let c0 = RayonComm::new(0, 2);
    let c1 = RayonComm::new(1, 2);

    let _ = c0.isend(1, tag.base(), &[1, 2, 3, 4, 5, 6]);
    let mut b = [0u8; 4];
    let h = c1.irecv(0, tag.base(), &mut b);
    let got = h.wait().unwrap();
    assert_eq!(got, vec![1, 2, 3, 4]);
}

#[test]
#[serial]
fn tags_do_not_cross() {
    let c0 = RayonComm::new(0, 2);
    let c1 = RayonComm::new(1, 2);

    let _ = c0.isend(1, 0x1004, b"b");
    let _ = c0.isend(1, 0x1003, b"a");
    let mut buf = [0u8; 1];
    assert_eq!(c1.irecv(0, 0x1003, &mut buf).wait().unwrap(), b"a");
    assert_eq!(c1.irecv(0, 0x1004, &mut buf).wait().unwrap(), b"b");
}

#[test]
fn world_groups_are_private() {
    let a = RayonComm::world(2);
    let b = RayonComm::world(2);
    let _ = a[0].isend(1, 0x2000, b"from-a");
    let _ = b[0].isend(1, 0x2000, b"from-b");

    let mut buf = [0u8; 6];
    assert_eq!(b[1].irecv(0, 0x2000, &mut buf).wait().unwrap(), b"from-b");
    assert_eq!(a[1].irecv(0, 0x2000, &mut buf).wait().unwrap(), b"from-a");
}

#[test]
fn no_comm_is_a_single_rank() {
    assert_eq!(NoComm.rank(), 0);
    assert_eq!(NoComm.size(), 1);
    assert!(NoComm.is_no_comm());
    assert!(NoComm.isend(0, 1, b"x").wait().is_none());
}

#[test]
fn result_variants_check_peers() {
    let ranks = RayonComm::world(2);
    let mut buf = [0u8; 1];
    assert!(matches!(
        ranks[0].irecv_result(2, 1, &mut buf),
        Err(QuadError::InvalidRank { rank: 2, size: 2 })
    ));
    assert!(ranks[0].isend_result(1, 1, b"k").is_ok());
}
