//! Wire-level properties of the frame codec

mod common;

use common::*;
use sekhub_lib::cipher::{CipherKey, TeaCipher};
use sekhub_lib::color::color_command_payload;
use sekhub_lib::sequence::SequenceCounter;
use std::collections::HashSet;
use std::sync::Arc;

fn codec() -> FrameCodec {
    FrameCodec::new(&CipherKey::default())
}

#[test]
fn test_roundtrip_all_payload_lengths() {
    let codec = codec();
    let commands = [
        CommandId::SetStaticColor,
        CommandId::Password,
        CommandId::PasswordAck,
        CommandId::Unknown(0x7E),
    ];
    for command in commands {
        for len in 0..=16usize {
            let payload: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37).wrapping_add(1)).collect();
            let wire = codec.build_frame(command, &payload).unwrap();
            let frame = codec.parse_frame(&wire).unwrap();

            assert_eq!(frame.command, command);
            assert_eq!(&frame.payload[..len], payload.as_slice());
            assert!(frame.payload[len..].iter().all(|&b| b == 0));
            assert_eq!(frame.sequence, codec.counter().current());
            assert!(frame.validate().is_ok(), "{:?} len {}", command, len);
        }
    }
}

#[test]
fn test_checksum_on_plaintext() {
    let codec = codec();
    let payload = color_command_payload(40, 100).unwrap();
    let wire = codec.build_frame(CommandId::SetStaticColor, &payload).unwrap();

    let mut plain = wire;
    TeaCipher::new(&CipherKey::default()).decrypt_blocks(&mut plain);
    let sum = plain[1..19].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    assert_eq!(plain[19], sum);
    assert_eq!(plain[0], 0x45);
    // checksum byte is outside the enciphered region
    assert_eq!(wire[19], sum);
}

#[test]
fn test_known_password_frame_on_wire() {
    let codec = codec();
    let wire = codec.build_frame(CommandId::Password, b"MONKEY").unwrap();
    // bytes 16..20 are sent in the clear: three zero payload bytes and the checksum
    assert_eq!(hex::encode(&wire[16..]), "000000d5");

    let mut plain = wire;
    TeaCipher::new(&CipherKey::default()).decrypt_blocks(&mut plain);
    assert_eq!(hex::encode(plain), "4501014d4f4e4b455900000000000000000000d5");
}

#[test]
fn test_sequence_cycles_after_256_frames() {
    let codec = codec();
    let first = codec
        .parse_frame(&codec.build_frame(CommandId::Password, &[]).unwrap())
        .unwrap()
        .sequence;

    let mut window = HashSet::new();
    let mut last = first;
    for _ in 0..256 {
        last = codec
            .parse_frame(&codec.build_frame(CommandId::Password, &[]).unwrap())
            .unwrap()
            .sequence;
        window.insert(last);
    }
    assert_eq!(last, first);
    assert_eq!(window.len(), 256);
}

#[test]
fn test_sequence_never_repeats_in_255_window() {
    let codec = FrameCodec::with_counter(&CipherKey::default(), Arc::new(SequenceCounter::starting_at(200)));
    let sequences: Vec<u8> = (0..600)
        .map(|_| {
            codec
                .parse_frame(&codec.build_frame(CommandId::SetStaticColor, &[]).unwrap())
                .unwrap()
                .sequence
        })
        .collect();
    for window in sequences.windows(255) {
        let unique: HashSet<_> = window.iter().collect();
        assert_eq!(unique.len(), 255);
    }
    assert_eq!(sequences[0], 201);
    assert_eq!(sequences[55], 0);
}

#[test]
fn test_malformed_lengths() {
    let codec = codec();
    for len in [19usize, 21] {
        let err = codec.parse_frame(&vec![0x45; len]).unwrap_err();
        assert!(matches!(err, HubError::MalformedFrame { actual } if actual == len));
    }
}

#[test]
fn test_different_keys_do_not_interoperate() {
    let ours = codec();
    let theirs = FrameCodec::new(&CipherKey::new(*b"0123456789abcdef"));
    let wire = ours.build_frame(CommandId::Password, b"MONKEY").unwrap();
    let frame = theirs.parse_frame(&wire).unwrap();
    assert_ne!(&frame.payload[..6], b"MONKEY");
}
