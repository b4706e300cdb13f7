use std::sync::Arc;

use approx::assert_abs_diff_eq;
use sig_core::{create_alexander_module, extract_signature};
use sig_store::{
    ExtractOptions, ExtractorConfig, SignatureExtractor, SignatureMemory, SignatureStore,
};

#[test]
fn test_stored_signature_indexed_by_prime() {
    let memory = SignatureMemory::new();
    let sig = Arc::new(extract_signature(&[3, 5, 7]).unwrap());
    memory.store(Arc::clone(&sig));

    let with_five = memory.find_by_prime(5);
    assert!(with_five.iter().any(|s| s.hash() == sig.hash()));
    assert_eq!(memory.get(sig.hash()).unwrap().primes(), &[3, 5, 7]);
}

#[test]
fn test_json_round_trip_through_factory() {
    let memory = SignatureMemory::new();
    memory.store(Arc::new(extract_signature(&[3, 5, 7]).unwrap()));
    memory.store(Arc::new(extract_signature(&[11, 13]).unwrap()));

    let json = memory.export_json_string().unwrap();
    let restored = SignatureMemory::from_json(&json, |primes| create_alexander_module(primes)).unwrap();

    let expected = extract_signature(&[3, 5, 7]).unwrap();
    assert!(restored.get(expected.hash()).is_some());
    assert_eq!(restored.len(), memory.len());
}

#[test]
fn test_extractor_backed_by_loaded_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signatures.db");

    let extractor = SignatureExtractor::new();
    extractor
        .extract_batch([vec![3, 5, 7], vec![5, 7, 11], vec![2, 17, 19, 23]])
        .unwrap();
    SignatureStore::open(&path)
        .unwrap()
        .save_memory(extractor.memory())
        .unwrap();

    let loaded = SignatureStore::open(&path)
        .unwrap()
        .load_memory(create_alexander_module)
        .unwrap();
    let reopened = SignatureExtractor::with_memory(Arc::new(loaded));

    let target = reopened.get_alignment_target(&[11, 7, 5]).unwrap().unwrap();
    assert_eq!(target.signature.primes(), &[5, 7, 11]);
    assert_abs_diff_eq!(target.distance, 0.0, epsilon = 1e-9);

    let resonant = reopened.find_resonant(&[3, 5, 7], None).unwrap();
    assert_eq!(resonant.len(), 3);
    assert!(resonant.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert_eq!(reopened.memory().len(), 3);
}

#[test]
fn test_config_file_drives_extractor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extractor.toml");
    std::fs::write(&path, "max_primes = 3\ntop_k = 1\n").unwrap();

    let extractor = SignatureExtractor::with_config(ExtractorConfig::load(&path).unwrap());
    assert!(extractor.extract(&[2, 3, 5, 7], ExtractOptions::default()).is_err());

    extractor.extract(&[2, 3], ExtractOptions::default()).unwrap();
    extractor.extract(&[5, 7], ExtractOptions::default()).unwrap();
    assert_eq!(extractor.find_resonant(&[2, 3, 5], None).unwrap().len(), 1);
}

#[test]
fn test_equivalence_search_through_extractor() {
    let extractor = SignatureExtractor::new();
    let stored = extractor.extract(&[5, 7, 11], ExtractOptions::default()).unwrap();
    extractor.extract(&[3, 5], ExtractOptions::default()).unwrap();

    let found = extractor.find_equivalent(&[11, 5, 7]).unwrap();
    assert_eq!(found.len(), 1);
    assert!(Arc::ptr_eq(&found[0], &stored));
}
