// Credential store - Firefox cookie blob <-> .env file <-> cookie file
//
// Cookies are kept as a single escaped string under the FIREFOX_COOKIES key
// in a flat key=value .env file. Literal newlines are stored as the
// two-character escape `\n` so the whole export fits on one line. The blob
// travels in both directions: a Netscape cookie file can be folded into a
// blob for persistence, and the blob is unfolded back into a temporary
// cookie file whenever a job needs authentication.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::errors::CredentialError;

/// Key the blob is stored under
pub const COOKIES_KEY: &str = "FIREFOX_COOKIES";

/// Escape sequence standing in for a newline inside the stored value
const NEWLINE_ESCAPE: &str = "\\n";

/// Fold a Netscape cookie file into the single-line blob form:
/// comment lines first, one blank separator, then cookie lines, joined by
/// the newline escape and wrapped as FIREFOX_COOKIES="...".
pub fn blob_from_cookie_file(path: &Path) -> Result<String, CredentialError> {
    let text = fs::read_to_string(path).map_err(|e| CredentialError::Read(e.to_string()))?;

    let mut parts: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with('#') {
            parts.push(line.trim());
        }
    }
    parts.push("");
    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            parts.push(trimmed);
        }
    }

    Ok(format!("{}=\"{}\"", COOKIES_KEY, parts.join(NEWLINE_ESCAPE)))
}

/// Unfold a blob back into a cookie file at `out_path`.
pub fn cookie_file_from_blob(blob: &str, out_path: &Path) -> Result<(), CredentialError> {
    let content = unwrap_blob(blob)?;
    fs::write(out_path, content.replace(NEWLINE_ESCAPE, "\n"))
        .map_err(|e| CredentialError::Write(e.to_string()))
}

/// Strip the KEY=" prefix and surrounding quotes, leaving the escaped content.
fn unwrap_blob(blob: &str) -> Result<&str, CredentialError> {
    let Some(idx) = blob.find("=\"") else {
        return Err(CredentialError::Format(
            "missing =\" delimiter".to_string(),
        ));
    };
    Ok(blob[idx + 1..].trim().trim_matches('"'))
}

/// Store bound to one persisted .env file.
pub struct CookieStore {
    env_file: PathBuf,
}

impl CookieStore {
    pub fn new(env_file: PathBuf) -> Self {
        Self { env_file }
    }

    /// Persist a full KEY="..." line. This overwrites the whole file with
    /// the single line; any other keys previously in the file are lost.
    pub fn persist_blob(&self, blob: &str) -> Result<(), CredentialError> {
        fs::write(&self.env_file, blob).map_err(|e| CredentialError::Write(e.to_string()))
    }

    /// Load the escaped cookie content from the .env file.
    pub fn load_blob(&self) -> Result<String, CredentialError> {
        match read_env_value(&self.env_file, COOKIES_KEY) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(CredentialError::Missing),
        }
    }

    /// Write the stored cookies to a fresh temporary file and return a
    /// scoped handle. The file is deleted when the handle drops, so the
    /// caller keeps it alive for exactly the duration of the job.
    pub fn materialize_temp_cookie_file(&self) -> Result<TempPath, CredentialError> {
        let content = self.load_blob()?.replace(NEWLINE_ESCAPE, "\n");

        let mut file = tempfile::Builder::new()
            .prefix("firefox-cookies-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| CredentialError::Write(e.to_string()))?;
        file.write_all(content.as_bytes())
            .map_err(|e| CredentialError::Write(e.to_string()))?;
        file.flush()
            .map_err(|e| CredentialError::Write(e.to_string()))?;

        Ok(file.into_temp_path())
    }
}

/// Read one value from a flat key=value file. Quotes around the value are
/// stripped; missing file or missing key both yield None.
pub(crate) fn read_env_value(path: &Path, key: &str) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            if k.trim() == key {
                return Some(v.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const COOKIE_FILE: &str = "\
# Netscape HTTP Cookie File
# https://curl.se/docs/http-cookies.html

.youtube.com\tTRUE\t/\tTRUE\t0\tPREF\tf1=50000000
.youtube.com\tTRUE\t/\tTRUE\t0\tVISITOR_INFO1_LIVE\tabcdef
";

    #[test]
    fn test_blob_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("cookies.txt");
        fs::write(&source, COOKIE_FILE).unwrap();

        let blob = blob_from_cookie_file(&source).unwrap();
        assert!(blob.starts_with("FIREFOX_COOKIES=\""));

        let restored = dir.path().join("restored.txt");
        cookie_file_from_blob(&blob, &restored).unwrap();

        let lines: Vec<String> = fs::read_to_string(&restored)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(lines[0], "# Netscape HTTP Cookie File");
        assert_eq!(lines[1], "# https://curl.se/docs/http-cookies.html");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with(".youtube.com"));
        assert!(lines[4].contains("VISITOR_INFO1_LIVE"));
    }

    #[test]
    fn test_blob_from_missing_file() {
        let result = blob_from_cookie_file(Path::new("/nonexistent/cookies.txt"));
        assert!(matches!(result, Err(CredentialError::Read(_))));
    }

    #[test]
    fn test_malformed_blob_rejected() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let result = cookie_file_from_blob("FIREFOX_COOKIES=no-quote", &out);
        assert!(matches!(result, Err(CredentialError::Format(_))));
    }

    #[test]
    fn test_load_blob_missing_key() {
        let dir = tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "OTHER_KEY=\"value\"\n").unwrap();

        let store = CookieStore::new(env);
        assert!(matches!(store.load_blob(), Err(CredentialError::Missing)));
    }

    #[test]
    fn test_load_blob_empty_value() {
        let dir = tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "FIREFOX_COOKIES=\"\"\n").unwrap();

        let store = CookieStore::new(env);
        assert!(matches!(store.load_blob(), Err(CredentialError::Missing)));
    }

    #[test]
    fn test_persist_overwrites_whole_file() {
        let dir = tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "USE_FIREFOX_COOKIES=True\nOTHER=1\n").unwrap();

        let store = CookieStore::new(env.clone());
        store
            .persist_blob("FIREFOX_COOKIES=\"# header\\n\\ncookie-line\"")
            .unwrap();

        let text = fs::read_to_string(&env).unwrap();
        assert!(text.starts_with("FIREFOX_COOKIES="));
        assert!(!text.contains("OTHER"));
    }

    #[test]
    fn test_materialize_unescapes_and_cleans_up() {
        let dir = tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "FIREFOX_COOKIES=\"# header\\n\\ncookie-line\"").unwrap();

        let store = CookieStore::new(env);
        let temp = store.materialize_temp_cookie_file().unwrap();
        let written = fs::read_to_string(&temp).unwrap();
        assert_eq!(written, "# header\n\ncookie-line");

        let path = temp.to_path_buf();
        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn test_read_env_value_strips_quotes() {
        let dir = tempdir().unwrap();
        let env = dir.path().join(".env");
        fs::write(&env, "# comment\nUSE_FIREFOX_COOKIES=\"True\"\n").unwrap();

        let value = read_env_value(&env, "USE_FIREFOX_COOKIES");
        assert_eq!(value.as_deref(), Some("True"));
    }
}
