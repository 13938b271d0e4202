//! File action handlers.

use std::io;
use std::path::Path;

use rpaflow_types::action::{ActionKind, FilePathParams, FileTransferParams, FileWriteParams};
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

use super::{ActionContext, FILE_PREVIEW_CHARS, preview, require};

pub(super) async fn read(ctx: &ActionContext<'_>, params: FilePathParams) -> Result<Value, ActionError> {
    require(ActionKind::FileRead, "path", &params.path)?;
    ctx.info(format!("Reading file: {}", params.path));

    let content = ctx
        .session
        .capabilities()
        .fs
        .read_to_string(Path::new(&params.path))
        .await
        .map_err(|e| fs_error(&params.path, e))?;

    let echoed = preview(&content, FILE_PREVIEW_CHARS);
    if let Some(name) = params.save_as.as_deref().filter(|n| !n.is_empty()) {
        ctx.session.set_variable(name, Value::String(content));
    }
    Ok(json!({ "content": echoed }))
}

pub(super) async fn write(
    ctx: &ActionContext<'_>,
    params: FileWriteParams,
) -> Result<Value, ActionError> {
    require(ActionKind::FileWrite, "path", &params.path)?;
    ctx.info(format!("Writing file: {}", params.path));

    ctx.session
        .capabilities()
        .fs
        .write(Path::new(&params.path), &params.content)
        .await
        .map_err(|e| fs_error(&params.path, e))?;
    Ok(json!({ "written": params.path }))
}

pub(super) async fn copy(
    ctx: &ActionContext<'_>,
    params: FileTransferParams,
) -> Result<Value, ActionError> {
    require(ActionKind::FileCopy, "source", &params.source)?;
    require(ActionKind::FileCopy, "destination", &params.destination)?;
    ctx.info(format!("Copying: {} -> {}", params.source, params.destination));

    ctx.session
        .capabilities()
        .fs
        .copy(Path::new(&params.source), Path::new(&params.destination))
        .await
        .map_err(|e| fs_error(&params.source, e))?;
    Ok(json!({ "copied": params.destination }))
}

pub(super) async fn rename(
    ctx: &ActionContext<'_>,
    params: FileTransferParams,
) -> Result<Value, ActionError> {
    require(ActionKind::FileMove, "source", &params.source)?;
    require(ActionKind::FileMove, "destination", &params.destination)?;
    ctx.info(format!("Moving: {} -> {}", params.source, params.destination));

    ctx.session
        .capabilities()
        .fs
        .rename(Path::new(&params.source), Path::new(&params.destination))
        .await
        .map_err(|e| fs_error(&params.source, e))?;
    Ok(json!({ "moved": params.destination }))
}

pub(super) async fn delete(
    ctx: &ActionContext<'_>,
    params: FilePathParams,
) -> Result<Value, ActionError> {
    require(ActionKind::FileDelete, "path", &params.path)?;
    ctx.info(format!("Deleting: {}", params.path));

    ctx.session
        .capabilities()
        .fs
        .remove_file(Path::new(&params.path))
        .await
        .map_err(|e| fs_error(&params.path, e))?;
    Ok(json!({ "deleted": params.path }))
}

pub(super) async fn exists(
    ctx: &ActionContext<'_>,
    params: FilePathParams,
) -> Result<Value, ActionError> {
    require(ActionKind::FileExists, "path", &params.path)?;

    let exists = ctx
        .session
        .capabilities()
        .fs
        .exists(Path::new(&params.path))
        .await;
    if let Some(name) = params.save_as.as_deref().filter(|n| !n.is_empty()) {
        ctx.session.set_variable(name, Value::Bool(exists));
    }
    Ok(json!({ "exists": exists }))
}

fn fs_error(path: &str, error: io::Error) -> ActionError {
    ActionError::FileSystem(format!("{path}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StepFixture;

    fn path(p: &str, save_as: Option<&str>) -> FilePathParams {
        FilePathParams {
            path: p.to_string(),
            save_as: save_as.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn read_truncates_echo_but_saves_everything() {
        let fixture = StepFixture::new();
        let content = "z".repeat(600);
        fixture.harness.fs.put("big.txt", &content);

        let result = read(&fixture.ctx(), path("big.txt", Some("body")))
            .await
            .unwrap();
        assert_eq!(result["content"], format!("{}...", "z".repeat(500)));
        assert_eq!(fixture.session.get_variable("body"), Some(json!(content)));
    }

    #[tokio::test]
    async fn read_missing_file_is_a_filesystem_error() {
        let fixture = StepFixture::new();
        let err = read(&fixture.ctx(), path("nope.txt", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::FileSystem(ref m) if m.starts_with("nope.txt")));
    }

    #[tokio::test]
    async fn write_copy_move_delete() {
        let fixture = StepFixture::new();
        let ctx = fixture.ctx();

        let written = write(
            &ctx,
            FileWriteParams {
                path: "a.txt".to_string(),
                content: "hello".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(written, json!({"written": "a.txt"}));

        let copied = copy(
            &ctx,
            FileTransferParams {
                source: "a.txt".to_string(),
                destination: "b.txt".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(copied, json!({"copied": "b.txt"}));

        let moved = rename(
            &ctx,
            FileTransferParams {
                source: "b.txt".to_string(),
                destination: "c.txt".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(moved, json!({"moved": "c.txt"}));
        assert_eq!(fixture.harness.fs.get("c.txt").as_deref(), Some("hello"));
        assert!(fixture.harness.fs.get("b.txt").is_none());

        let deleted = delete(&ctx, path("a.txt", None)).await.unwrap();
        assert_eq!(deleted, json!({"deleted": "a.txt"}));
        assert!(fixture.harness.fs.get("a.txt").is_none());
    }

    #[tokio::test]
    async fn exists_saves_a_boolean() {
        let fixture = StepFixture::new();
        fixture.harness.fs.put("present.txt", "");

        let yes = exists(&fixture.ctx(), path("present.txt", Some("found")))
            .await
            .unwrap();
        assert_eq!(yes, json!({"exists": true}));
        assert_eq!(fixture.session.get_variable("found"), Some(json!(true)));

        let no = exists(&fixture.ctx(), path("absent.txt", Some("found")))
            .await
            .unwrap();
        assert_eq!(no, json!({"exists": false}));
        assert_eq!(fixture.session.get_variable("found"), Some(json!(false)));
    }
}
