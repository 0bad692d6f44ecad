use crate::backend::{Backend, BackendKind};
use crate::connection::{check_status, join_segments, send, Connection, Target};
use crate::decode::{decode_base64, into_text};
use async_trait::async_trait;
use pipeconf_core::{Coordinates, DirEntry, EntryKind, FetchError};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::warn;

const API_SUFFIX: &str = "/api/v4";

/// Listing page size. Only the first page is read.
pub const TREE_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct TreeNode {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl TreeNode {
    fn entry_kind(&self) -> EntryKind {
        match self.kind.as_str() {
            "blob" => EntryKind::File,
            "tree" => EntryKind::Directory,
            "commit" => EntryKind::Submodule,
            _ => EntryKind::Other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryFile {
    content: String,
}

/// GitLab (gitlab.com or self-managed), via the repository tree and files APIs
#[derive(Debug, Clone)]
pub struct GitLabBackend {
    connection: Connection,
}

impl GitLabBackend {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// `projects/<namespace/repo>/repository/<rest..>`, with the project id
    /// as a single encoded segment
    fn repository_url(&self, coords: &Coordinates, rest: &[&str]) -> Result<Url, FetchError> {
        let base = self.connection.api_base(API_SUFFIX)?;
        let project_id = format!("{}/{}", coords.namespace, coords.repository);
        join_segments(
            &base,
            ["projects", project_id.as_str(), "repository"]
                .into_iter()
                .chain(rest.iter().copied()),
        )
    }
}

#[async_trait]
impl Backend for GitLabBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GitLab
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn list_entries(&self, client: &Client, coords: &Coordinates) -> Result<Vec<DirEntry>, FetchError> {
        let url = self.repository_url(coords, &["tree"])?;
        let per_page = TREE_PAGE_SIZE.to_string();
        let request = client.get(url).query(&[
            ("path", coords.path.as_str()),
            ("ref", coords.branch.as_str()),
            ("per_page", per_page.as_str()),
        ]);

        let response = send(self.connection.authorize(request)).await?;
        let response = check_status(response, Target::Directory(&coords.path)).await?;

        let has_next_page = response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.trim().is_empty());
        if has_next_page {
            warn!(
                path = %coords.path,
                per_page = TREE_PAGE_SIZE,
                "Directory has more entries than one page, the rest are ignored"
            );
        }

        let nodes = response
            .json::<Vec<TreeNode>>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        Ok(nodes
            .into_iter()
            .map(|node| {
                let kind = node.entry_kind();
                DirEntry::new(node.name, node.path, kind)
            })
            .collect())
    }

    async fn fetch_file(&self, client: &Client, coords: &Coordinates, entry: &DirEntry) -> Result<String, FetchError> {
        let url = self.repository_url(coords, &["files", entry.path.as_str()])?;
        let request = client.get(url).query(&[("ref", coords.branch.as_str())]);

        let response = send(self.connection.authorize(request)).await?;
        let response = check_status(response, Target::File(&entry.path)).await?;

        let file = response
            .json::<RepositoryFile>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        // The files API always hands out base64
        into_text(decode_base64(&file.content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::TlsMode;
    use mockito::Matcher;
    use serde_json::json;

    const TREE_PATH: &str = "/api/v4/projects/admin%2Fwoodpeckerfiles/repository/tree";

    fn coords() -> Coordinates {
        Coordinates {
            namespace: "admin".to_string(),
            repository: "woodpeckerfiles".to_string(),
            branch: "main".to_string(),
            path: "myapp/main".to_string(),
        }
    }

    fn backend(server: &mockito::Server) -> GitLabBackend {
        GitLabBackend::new(Connection::new(server.url(), "glpat-token", TlsMode::Verify))
    }

    fn node(name: &str, kind: &str) -> serde_json::Value {
        json!({"id": "0", "name": name, "type": kind, "path": format!("myapp/main/{}", name), "mode": "100644"})
    }

    fn tree_query() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("path".into(), "myapp/main".into()),
            Matcher::UrlEncoded("ref".into(), "main".into()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ])
    }

    async fn mock_file(server: &mut mockito::Server, name: &str, content: &str) -> mockito::Mock {
        server
            .mock(
                "GET",
                format!(
                    "/api/v4/projects/admin%2Fwoodpeckerfiles/repository/files/myapp%2Fmain%2F{}",
                    name
                )
                .as_str(),
            )
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "file_name": name,
                    "file_path": format!("myapp/main/{}", name),
                    "encoding": "base64",
                    "content": content,
                    "ref": "main",
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_fetch_directory_decodes_base64() {
        let mut server = mockito::Server::new_async().await;

        let tree = server
            .mock("GET", TREE_PATH)
            .match_query(tree_query())
            .match_header("authorization", "Bearer glpat-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    node("build.yml", "blob"),
                    node("notes.txt", "blob"),
                    node("deploy.yaml", "blob"),
                    node("sub.yml", "tree"),
                ])
                .to_string(),
            )
            .create_async()
            .await;

        // "steps: []" / "when: []\nsteps: []\n"
        let build = mock_file(&mut server, "build.yml", "c3RlcHM6IFtd").await;
        let deploy = mock_file(&mut server, "deploy.yaml", "d2hlbjogW10Kc3RlcHM6IFtdCg==").await;

        let records = backend(&server).fetch_directory(&coords()).await.unwrap();

        tree.assert_async().await;
        build.assert_async().await;
        deploy.assert_async().await;

        assert_eq!(records.len(), 2);
        let build_record = records.iter().find(|r| r.name == "build.yml").unwrap();
        assert_eq!(build_record.content, "steps: []");
        let deploy_record = records.iter().find(|r| r.name == "deploy.yaml").unwrap();
        assert_eq!(deploy_record.content, "when: []\nsteps: []\n");
    }

    #[tokio::test]
    async fn test_fetch_directory_skips_undecodable_file() {
        let mut server = mockito::Server::new_async().await;

        let _tree = server
            .mock("GET", TREE_PATH)
            .match_query(tree_query())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([node("good.yml", "blob"), node("bad.yml", "blob")]).to_string())
            .create_async()
            .await;
        let _good = mock_file(&mut server, "good.yml", "c3RlcHM6IFtd").await;
        let _bad = mock_file(&mut server, "bad.yml", "steps: [] is not base64").await;

        let records = backend(&server).fetch_directory(&coords()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "good.yml");
    }

    #[tokio::test]
    async fn test_fetch_directory_skips_file_with_http_error() {
        let mut server = mockito::Server::new_async().await;

        let _tree = server
            .mock("GET", TREE_PATH)
            .match_query(tree_query())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([node("a.yml", "blob"), node("b.yml", "blob")]).to_string())
            .create_async()
            .await;
        let _a = server
            .mock("GET", "/api/v4/projects/admin%2Fwoodpeckerfiles/repository/files/myapp%2Fmain%2Fa.yml")
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .with_status(500)
            .with_body(r#"{"message":"500 Internal Server Error"}"#)
            .create_async()
            .await;
        let _b = mock_file(&mut server, "b.yml", "c3RlcHM6IFtd").await;

        let records = backend(&server).fetch_directory(&coords()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "b.yml");
        assert_eq!(records[0].content, "steps: []");
    }

    #[tokio::test]
    async fn test_fetch_directory_warns_but_reads_first_page() {
        let mut server = mockito::Server::new_async().await;

        let _tree = server
            .mock("GET", TREE_PATH)
            .match_query(tree_query())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-next-page", "2")
            .with_body(json!([node("build.yml", "blob")]).to_string())
            .create_async()
            .await;
        let _build = mock_file(&mut server, "build.yml", "c3RlcHM6IFtd").await;

        let records = backend(&server).fetch_directory(&coords()).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_directory_tree_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _tree = server
            .mock("GET", TREE_PATH)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"404 Tree Not Found"}"#)
            .create_async()
            .await;

        let err = backend(&server).fetch_directory(&coords()).await.unwrap_err();
        assert!(matches!(err, FetchError::DirectoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_directory_forbidden() {
        let mut server = mockito::Server::new_async().await;
        let _tree = server
            .mock("GET", TREE_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = backend(&server).fetch_directory(&coords()).await.unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized(_)));
    }

    #[test]
    fn test_repository_url_for_self_managed_instance() {
        let backend = GitLabBackend::new(Connection::new("https://gitlab.corp.example/", "", TlsMode::Verify));
        let url = backend
            .repository_url(&coords(), &["files", "myapp/main/build.yml"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.corp.example/api/v4/projects/admin%2Fwoodpeckerfiles/repository/files/myapp%2Fmain%2Fbuild.yml"
        );
    }
}
