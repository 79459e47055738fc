//! # Round-Trip Tests
//!
//! End-to-end runs through the native codecs: symbols are written to real
//! files, then read back out of them.

use barstamp::codec::NativeImageCodec;
use barstamp::runtime::{CodecRuntime, NativeLoader};
use barstamp::{
    Base, BlankCanvas, Engine, Position, ReaderOptions, Stage, SymbolFormat, SymbolSpec,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Fresh directory under the system temp dir; the engine creates it on write.
fn scratch() -> PathBuf {
    std::env::temp_dir().join(format!("barstamp-test-{}", uuid::Uuid::new_v4()))
}

fn texts(found: &[barstamp::DecodedSymbol]) -> BTreeSet<String> {
    found.iter().map(|s| s.text.clone()).collect()
}

// ============================================================================
// COMPOSITE
// ============================================================================

#[tokio::test]
async fn test_single_code_on_blank_canvas() {
    let engine = Engine::native();
    let output = scratch().join("output.png");

    let result = engine
        .write_symbols(
            &[SymbolSpec::new("hello").position(Position::Middle)],
            &output,
            Some(&Base::blank()),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.created.len(), 1);
    let file = &result.created[0];
    assert_eq!(file.path, output);
    assert_eq!((file.width, file.height), (600, 800));
    assert_eq!(file.format, "png");
    assert!(file.size > 0);

    let found = engine.read_symbols(&output, None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "hello");
    assert_eq!(found[0].format, SymbolFormat::QrCode);
}

#[tokio::test]
async fn test_two_codes_on_blank_canvas() {
    let engine = Engine::native();
    let output = scratch().join("output.png");
    let specs = [
        SymbolSpec::new("This is the content of my QR code").position(Position::Middle),
        SymbolSpec::new("Another QR code").position(Position::BottomLeft),
    ];

    engine
        .write_symbols(&specs, &output, Some(&Base::blank()))
        .await
        .unwrap();

    let found = engine.read_symbols(&output, None).await.unwrap();
    assert_eq!(
        texts(&found),
        BTreeSet::from([
            "This is the content of my QR code".to_string(),
            "Another QR code".to_string(),
        ])
    );
}

#[tokio::test]
async fn test_code_onto_existing_image() {
    let engine = Engine::native();
    let dir = scratch();
    let first = dir.join("first.png");
    let second = dir.join("second.png");

    engine
        .write_symbols(
            &[SymbolSpec::new("first").position(Position::TopLeft)],
            &first,
            Some(&Base::Blank(BlankCanvas::new(500, 500))),
        )
        .await
        .unwrap();

    let result = engine
        .write_symbols(
            &[SymbolSpec::new("second").position(Position::BottomRight)],
            &second,
            Some(&Base::Path(first.clone())),
        )
        .await
        .unwrap();
    assert_eq!((result.created[0].width, result.created[0].height), (500, 500));

    let found = engine.read_symbols(&second, None).await.unwrap();
    assert_eq!(
        texts(&found),
        BTreeSet::from(["first".to_string(), "second".to_string()])
    );
}

#[tokio::test]
async fn test_geometry_failure_writes_nothing() {
    let engine = Engine::native();
    let dir = scratch();

    let err = engine
        .write_symbols(
            &[SymbolSpec::new("too big").size(700, 700)],
            dir.join("output.png"),
            Some(&Base::blank()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Validation);
    assert_eq!(err.index(), Some(0));
    assert!(!dir.join("output.png").exists());
}

// ============================================================================
// MULTI-FILE
// ============================================================================

#[tokio::test]
async fn test_separate_files_are_numbered() {
    let engine = Engine::native();
    let dir = scratch();
    let specs = [
        SymbolSpec::new("one"),
        SymbolSpec::new("ABC-123")
            .format(SymbolFormat::Code128)
            .size(300, 80),
    ];

    let result = engine
        .write_symbols(&specs, dir.join("codes.png"), None)
        .await
        .unwrap();

    let paths: Vec<PathBuf> = result.created.iter().map(|f| f.path.clone()).collect();
    assert_eq!(paths, vec![dir.join("codes-001.png"), dir.join("codes-002.png")]);
    assert!(paths.iter().all(|p| p.is_file()));
    assert_eq!((result.created[1].width, result.created[1].height), (300, 80));

    let found = engine
        .read_symbols(&paths[0], Some(&ReaderOptions::formats([SymbolFormat::QrCode])))
        .await
        .unwrap();
    assert_eq!(texts(&found), BTreeSet::from(["one".to_string()]));
}

#[tokio::test]
async fn test_encode_failure_creates_no_directory() {
    let engine = Engine::native();
    let dir = scratch();
    let specs = [
        SymbolSpec::new("fine"),
        SymbolSpec::new("12345").format(SymbolFormat::Ean13),
    ];

    let err = engine
        .write_symbols(&specs, dir.join("codes.png"), None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Encode);
    assert_eq!(err.index(), Some(1));
    assert!(!dir.exists());
}

// ============================================================================
// READ
// ============================================================================

#[tokio::test]
async fn test_read_missing_file_is_decode_error() {
    let engine = Engine::native();
    let err = engine
        .read_symbols(scratch().join("nothing.png"), None)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Decode);
}

#[tokio::test]
async fn test_engine_with_own_runtime() {
    let runtime = Arc::new(CodecRuntime::new(NativeLoader::default()));
    let engine = Engine::new(runtime.clone(), Arc::new(NativeImageCodec::default()));
    assert!(!runtime.is_loaded());

    let output = scratch().join("jpeg.jpeg");
    engine
        .write_symbols(&[SymbolSpec::new("lossy")], &output, Some(&Base::blank()))
        .await
        .unwrap();
    assert!(runtime.is_loaded());

    let found = engine.read_symbols(&output, None).await.unwrap();
    assert_eq!(texts(&found), BTreeSet::from(["lossy".to_string()]));
}
