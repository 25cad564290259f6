use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use anki_vocab_backend::services::lexical::{HttpLexicalClient, LexicalClient};
use anki_vocab_backend::services::speech::{HttpSpeechClient, SpeechClient};
use anki_vocab_backend::services::transcription::{HttpTranscriptionClient, TranscriptionClient};
use anki_vocab_backend::services::ProviderError;

/// Minimal HTTP server answering every request with the same canned response
/// and counting how many requests arrived.
async fn stub_server(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}"), hits)
}

#[tokio::test]
async fn server_errors_are_retried_up_to_the_bound() {
    let (url, hits) = stub_server("HTTP/1.1 500 Internal Server Error", "").await;
    std::env::set_var("WORDNET_API_ENDPOINT", &url);

    let client = HttpLexicalClient::from_env();
    let err = client.synsets("apple").await.unwrap_err();

    assert!(matches!(err, ProviderError::HttpStatus { status, .. } if status.as_u16() == 500));
    // Initial attempt plus two retries.
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_terminal() {
    let (url, hits) = stub_server("HTTP/1.1 400 Bad Request", "").await;
    std::env::set_var("DICTIONARY_API_ENDPOINT", &url);

    let client = HttpTranscriptionClient::from_env();
    let err = client.transcribe("apple").await.unwrap_err();

    assert!(matches!(err, ProviderError::HttpStatus { status, .. } if status.as_u16() == 400));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_synthesis_response_is_terminal() {
    let (url, hits) = stub_server("HTTP/1.1 200 OK", "").await;
    std::env::set_var("TTS_API_ENDPOINT", &url);

    let client = HttpSpeechClient::from_env();
    let err = client.synthesize("apple").await.unwrap_err();

    assert!(matches!(err, ProviderError::Empty));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
