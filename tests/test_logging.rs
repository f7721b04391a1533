use fresh::logging;

#[test]
fn test_file_logging_writes_session_separator() -> anyhow::Result<()> {
    let test_dir = tempfile::tempdir()?;
    let log_dir = test_dir.path().join("logs");

    logging::init(Some(&log_dir))?;
    tracing::info!("Test info message");
    tracing::warn!("Test warning message");

    let log_file = log_dir.join(logging::LOG_FILE_NAME);
    assert!(log_file.exists(), "log file not created: {}", log_file.display());

    let contents = std::fs::read_to_string(&log_file)?;
    assert!(contents.contains("New reset session"));
    assert!(contents.contains(&"=".repeat(80)));
    Ok(())
}
