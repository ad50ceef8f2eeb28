use super::{GraphDocument, GraphMirror, LOG_TARGET};
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::IntoAppError;
use std::io;

/// A mirror writing each namespace as a JSON document under a directory.
#[derive(Debug, Clone)]
pub struct JsonGraphSink {
    dir: Utf8PathBuf,
}

impl JsonGraphSink {
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn namespace_path(&self, namespace: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}.graph.json", file_stem(namespace)))
    }
}

/// `owner/name` becomes `owner@name`; `@` never appears in repository names.
fn file_stem(namespace: &str) -> String {
    let s = namespace.replace("..", "__").replace('/', "@");
    s.replace(['\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

impl GraphMirror for JsonGraphSink {
    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        let path = self.namespace_path(namespace);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::debug!(target: LOG_TARGET, "Deleted graph namespace '{namespace}'");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).into_app_err_with(|| format!("deleting graph namespace '{namespace}' at '{path}'")),
        }
    }

    async fn write(&self, document: &GraphDocument) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .into_app_err_with(|| format!("creating graph directory '{}'", self.dir))?;

        let path = self.namespace_path(&document.namespace);
        let body = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&path, body)
            .await
            .into_app_err_with(|| format!("writing graph namespace '{}' to '{path}'", document.namespace))?;

        log::debug!(
            target: LOG_TARGET,
            "Wrote {} nodes and {} relationships to graph namespace '{}'",
            document.nodes.len(),
            document.relationships.len(),
            document.namespace
        );
        Ok(())
    }

    async fn load(&self, namespace: &str) -> Result<Option<GraphDocument>> {
        let path = self.namespace_path(namespace);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).into_app_err_with(|| format!("reading graph namespace '{namespace}' at '{path}'")),
        };

        let document = serde_json::from_slice(&body).into_app_err_with(|| format!("parsing graph namespace file '{path}'"))?;
        Ok(Some(document))
    }
}
