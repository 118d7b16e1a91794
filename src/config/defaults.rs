//! Default values for configuration

/// Default owner identifier (single-operator deployments)
pub fn default_owner_id() -> String {
    "00000000-0000-0000-0000-000000000001".to_string()
}

/// Default target characters per chunk
pub fn default_chunk_target_chars() -> usize {
    1200
}

/// Default hard maximum characters per chunk (~8000 tokens at 3 chars/token)
pub fn default_chunk_max_chars() -> usize {
    24_000
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("EMBEDDING_BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:8876".to_string())
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Default embedding dimension for text-embedding-3-small
pub fn default_embedding_dimension() -> usize {
    1536
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default maximum embedding attempts per chunk
pub fn default_embedding_max_attempts() -> u32 {
    3
}

/// Default backoff unit between embedding attempts (multiplied by the
/// attempt number)
pub fn default_embedding_backoff_ms() -> u64 {
    250
}

/// Default extraction service URL
pub fn default_extraction_url() -> String {
    std::env::var("EXTRACTION_URL").unwrap_or_else(|_| "http://127.0.0.1:8890".to_string())
}

/// Default environment variable name for the extraction service API key
pub fn default_extraction_api_key_env() -> String {
    "EXTRACTION_API_KEY".to_string()
}

/// Default extraction request timeout in seconds
pub fn default_extraction_timeout() -> u64 {
    60
}

/// Default speech-to-text service URL
pub fn default_speech_url() -> String {
    std::env::var("SPEECH_URL").unwrap_or_else(|_| "http://127.0.0.1:8855".to_string())
}

/// Default environment variable name for the speech service API key
pub fn default_speech_api_key_env() -> String {
    "SPEECH_API_KEY".to_string()
}

/// Default speech request timeout in seconds
pub fn default_speech_timeout() -> u64 {
    60
}

/// Default interval between transcription status polls (milliseconds)
pub fn default_poll_interval_ms() -> u64 {
    10_000
}

/// Default maximum transcription status polls before timing out
pub fn default_max_poll_attempts() -> u32 {
    90
}

/// Default transcript-fetch service URL
pub fn default_transcript_url() -> String {
    std::env::var("TRANSCRIPT_URL").unwrap_or_else(|_| "http://127.0.0.1:8866".to_string())
}

/// Default environment variable name for the transcript service API key
pub fn default_transcript_api_key_env() -> String {
    "TRANSCRIPT_API_KEY".to_string()
}

/// Default transcript-fetch timeout in seconds
pub fn default_transcript_timeout() -> u64 {
    30
}

/// Default blob storage URL
pub fn default_storage_url() -> String {
    std::env::var("STORAGE_URL").unwrap_or_else(|_| "http://127.0.0.1:8800".to_string())
}

/// Default storage bucket name
pub fn default_storage_bucket() -> String {
    "documents".to_string()
}

/// Default environment variable name for the storage API key
pub fn default_storage_api_key_env() -> String {
    "STORAGE_API_KEY".to_string()
}

/// Default signed URL lifetime in seconds (3 days)
pub fn default_signed_url_ttl_secs() -> u64 {
    60 * 60 * 24 * 3
}

/// Default storage request timeout in seconds
pub fn default_storage_timeout() -> u64 {
    60
}

/// Default blob retention before purge (days)
pub fn default_purge_retention_days() -> i64 {
    30
}

/// Default maximum objects listed per purge run
pub fn default_purge_list_limit() -> usize {
    1000
}
