//! Writes the sitemap index and swaps it into place.

use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::errors::{Error, Result};
use crate::pager::remove_if_exists;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// A fully written, closed index file that is not visible under its final path yet.
#[derive(Debug)]
#[must_use = "the index is not published until `publish` is called"]
pub struct TempIndex {
    tmp_path: PathBuf,
    path: PathBuf,
}

impl TempIndex {
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Replaces whatever is at the final path with the temp file.
    pub async fn publish(self) -> Result<PathBuf> {
        remove_if_exists(&self.path).await?;
        tokio::fs::rename(&self.tmp_path, &self.path)
            .await
            .map_err(|e| Error::fs(&self.path, e))?;
        tracing::info!("Published sitemap index '{}'", self.path.display());
        Ok(self.path)
    }
}

/// Writes the index document to `<path>.tmp`. Nothing at `path` is touched.
pub async fn write_temp(path: &Path, entries: &[String]) -> Result<TempIndex> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Some(parent) = tmp_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| Error::fs(parent, e))?;
    }

    let file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| Error::fs(&tmp_path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render(entries).as_bytes())
        .await
        .map_err(|e| Error::fs(&tmp_path, e))?;
    writer.flush().await.map_err(|e| Error::fs(&tmp_path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| Error::fs(&tmp_path, e))?;

    Ok(TempIndex {
        tmp_path,
        path: path.to_path_buf(),
    })
}

/// Writes and publishes the index in one go.
pub async fn write(path: &Path, entries: &[String]) -> Result<PathBuf> {
    write_temp(path, entries).await?.publish().await
}

fn render(entries: &[String]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<sitemapindex xmlns=\"{}\">\n", SITEMAP_NAMESPACE));
    for loc in entries {
        xml.push_str(&format!("<sitemap><loc>{}</loc></sitemap>\n", escape(loc.as_str())));
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escapes_loc() {
        let xml = render(&["https://example.com/a_sitemap_00001_00001.xml?x=1&y=2".to_string()]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<sitemap><loc>https://example.com/a_sitemap_00001_00001.xml?x=1&amp;y=2</loc></sitemap>\n"));
        assert!(xml.ends_with("</sitemapindex>\n"));
    }

    #[test]
    fn test_render_empty_index() {
        let xml = render(&[]);
        assert!(!xml.contains("<sitemap>"));
        assert_eq!(xml.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_write_replaces_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        tokio::fs::write(&path, "old").await.unwrap();

        write(&path, &["https://example.com/one.xml".to_string()]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("<loc>https://example.com/one.xml</loc>"));
        assert!(!dir.path().join("sitemap.xml.tmp").exists());
    }

    #[tokio::test]
    async fn test_unpublished_temp_leaves_prior_index_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        write(&path, &["https://example.com/first.xml".to_string()]).await.unwrap();
        let before = tokio::fs::read_to_string(&path).await.unwrap();

        // Simulates a crash between writing the temp file and renaming it.
        let pending = write_temp(&path, &["https://example.com/second.xml".to_string()])
            .await
            .unwrap();
        assert!(pending.tmp_path().exists());
        drop(pending);

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_stale_temp_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        tokio::fs::write(dir.path().join("sitemap.xml.tmp"), "<half").await.unwrap();

        write(&path, &[]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.ends_with("</sitemapindex>\n"));
    }
}
