//! Steps for compression behavioural tests.
use cucumber::{given, then, when};
use wireline::compression::CompressorId;

use crate::world::{CompressionWorld, TestResult};

#[given(expr = "a payload of {int} bytes")]
fn given_payload(world: &mut CompressionWorld, len: usize) {
    world.set_payload((0..len).map(|i| u8::try_from(i % 251).expect("below 256")).collect());
}

#[given(expr = "a payload of {int} zero bytes")]
fn given_zero_payload(world: &mut CompressionWorld, len: usize) { world.set_payload(vec![0; len]); }

#[when(expr = "it is compressed with {word}")]
fn when_compressed(world: &mut CompressionWorld, compressor: String) -> TestResult {
    let compressor: CompressorId = compressor.parse()?;
    world.compress(compressor)
}

#[then("decompressing it with the true size restores the payload")]
fn then_round_trip(world: &mut CompressionWorld) -> TestResult {
    let declared = i32::try_from(world.payload().len())?;
    let restored = world.decompress_as(declared)?;
    assert_eq!(restored, world.payload());
    Ok(())
}

#[then(expr = "decompressing it as {int} bytes fails with a framing error")]
fn then_framing_error(world: &mut CompressionWorld, declared: i32) {
    let err = world
        .decompress_as(declared)
        .expect_err("declared size is wrong");
    assert!(err.is_framing(), "{err}");
}
