use std::io;
use std::path::PathBuf;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        NotFound(path: PathBuf) {
            display("Can't find {}", path.display())
        }
        UnsupportedFormat(path: PathBuf) {
            display("{} is not a PNG, JPEG or GIF image", path.display())
        }
        CorruptData(msg: String) {
            display("{}", msg)
        }
        Write(msg: String) {
            display("{}", msg)
        }
        DirectoryList(path: PathBuf, err: io::Error) {
            display("Can't list frames in {}: {}", path.display(), err)
            source(err)
        }
        FrameCountMismatch(frames: usize, positions: usize) {
            display("Found {} frames, but there are positions for {}", frames, positions)
        }
        ExternalTool(msg: String) {
            display("{}", msg)
        }
        NoFrames {
            display("Found no usable frames to encode")
        }
        WrongSize(msg: String) {
            display("{}", msg)
        }
        InvalidConfig(msg: &'static str) {
            display("Invalid configuration: {}", msg)
        }
        Aborted {
            display("aborted")
        }
        Io(err: io::Error) {
            from()
            display("I/O: {}", err)
            source(err)
        }
        Gif(err: gif::EncodingError) {
            from()
            display("gif error: {}", err)
            source(err)
        }
        Resize(err: resize::Error) {
            from()
            display("resize error: {}", err)
        }
    }
}

pub type ParrotResult<T, E = Error> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_file() {
        let err = Error::NotFound(PathBuf::from("frames/03.png"));
        assert_eq!(err.to_string(), "Can't find frames/03.png");

        let err = Error::UnsupportedFormat(PathBuf::from("input.bmp"));
        assert!(err.to_string().starts_with("input.bmp "));
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn mismatch_reports_both_counts() {
        let msg = Error::FrameCountMismatch(11, 10).to_string();
        assert!(msg.contains("11") && msg.contains("10"));
    }
}
