pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;
