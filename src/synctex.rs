//! SyncTeX forward and inverse search
//!
//! Queries are scoped to the most recent successful build. A query made
//! before any build succeeded, or whose scope moves while it is in flight,
//! returns `None` rather than a mapping from the wrong PDF.

use crate::error::TexsyncResult;
use crate::remote::{CompileService, EditQuery, EditResult, ViewQuery, ViewResult};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub struct SynctexMapper {
    service: Arc<dyn CompileService>,
    scope: watch::Receiver<Option<String>>,
}

impl SynctexMapper {
    /// Follow the controller's last successful build
    pub fn new(service: Arc<dyn CompileService>, scope: watch::Receiver<Option<String>>) -> Self {
        Self { service, scope }
    }

    /// Pin queries to one known build id
    pub fn fixed(service: Arc<dyn CompileService>, build_id: Option<String>) -> Self {
        let (tx, scope) = watch::channel(build_id);
        // Keep the value readable after the sender is gone
        drop(tx);
        Self { service, scope }
    }

    /// Build the current queries run against
    pub fn build_id(&self) -> Option<String> {
        self.scope.borrow().clone()
    }

    /// Forward search: source position to PDF location.
    ///
    /// `line` and `column` are 1-based.
    pub async fn from_cursor(
        &self,
        file: &str,
        line: u32,
        column: u32,
    ) -> TexsyncResult<Option<ViewResult>> {
        if line == 0 || column == 0 {
            return Ok(None);
        }
        let Some(build_id) = self.build_id() else {
            debug!("No successful build yet, skipping forward search");
            return Ok(None);
        };

        let query = ViewQuery {
            file: file.to_string(),
            line,
            column,
        };
        let result = self.service.synctex_view(&build_id, &query).await?;
        Ok(self.if_current(&build_id, result))
    }

    /// Inverse search: PDF point to source position.
    ///
    /// `page` is 1-based; `x`/`y` are PDF points from the top-left corner.
    pub async fn from_click(&self, page: u32, x: f64, y: f64) -> TexsyncResult<Option<EditResult>> {
        if page == 0 {
            return Ok(None);
        }
        let Some(build_id) = self.build_id() else {
            debug!("No successful build yet, skipping inverse search");
            return Ok(None);
        };

        let result = self
            .service
            .synctex_edit(&build_id, &EditQuery { page, x, y })
            .await?;
        Ok(self.if_current(&build_id, result))
    }

    fn if_current<T>(&self, queried: &str, result: Option<T>) -> Option<T> {
        if self.scope.borrow().as_deref() == Some(queried) {
            result
        } else {
            debug!("Build changed during SyncTeX query, discarding result for {}", queried);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeCompileService;

    fn view_hit() -> ViewResult {
        ViewResult {
            page: 3,
            x: 72.0,
            y: 144.5,
            file: "ch1.tex".to_string(),
            line: 12,
        }
    }

    #[tokio::test]
    async fn no_build_means_no_request() {
        let fake = Arc::new(FakeCompileService::default());
        let mapper = SynctexMapper::fixed(fake.clone(), None);

        assert_eq!(mapper.from_cursor("main.tex", 1, 1).await.unwrap(), None);
        assert_eq!(mapper.from_click(1, 10.0, 10.0).await.unwrap(), None);
        fake.with(|state| {
            assert!(state.view_queries.is_empty());
            assert!(state.edit_queries.is_empty());
        });
    }

    #[tokio::test]
    async fn forward_search_is_scoped_to_build() {
        let fake = Arc::new(FakeCompileService::default());
        fake.with(|state| state.view_result = Some(view_hit()));
        let mapper = SynctexMapper::fixed(fake.clone(), Some("b7".to_string()));

        let hit = mapper.from_cursor("ch1.tex", 12, 4).await.unwrap();

        assert_eq!(hit, Some(view_hit()));
        fake.with(|state| {
            let (build_id, query) = &state.view_queries[0];
            assert_eq!(build_id, "b7");
            assert_eq!(query.line, 12);
            assert_eq!(query.column, 4);
        });
    }

    #[tokio::test]
    async fn inverse_search_returns_source_position() {
        let fake = Arc::new(FakeCompileService::default());
        let expected = EditResult {
            file: "main.tex".to_string(),
            line: 40,
            col: 1,
        };
        fake.with(|state| state.edit_result = Some(expected.clone()));
        let mapper = SynctexMapper::fixed(fake, Some("b2".to_string()));

        assert_eq!(mapper.from_click(2, 100.0, 300.0).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn no_mapping_is_none() {
        let fake = Arc::new(FakeCompileService::default());
        let mapper = SynctexMapper::fixed(fake, Some("b2".to_string()));

        assert_eq!(mapper.from_cursor("main.tex", 5, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_positions_are_rejected_locally() {
        let fake = Arc::new(FakeCompileService::default());
        let mapper = SynctexMapper::fixed(fake.clone(), Some("b1".to_string()));

        assert_eq!(mapper.from_cursor("main.tex", 0, 1).await.unwrap(), None);
        assert_eq!(mapper.from_cursor("main.tex", 1, 0).await.unwrap(), None);
        assert_eq!(mapper.from_click(0, 1.0, 1.0).await.unwrap(), None);
        fake.with(|state| assert!(state.view_queries.is_empty()));
    }

    #[tokio::test]
    async fn follows_latest_successful_build() {
        let fake = Arc::new(FakeCompileService::default());
        fake.with(|state| state.view_result = Some(view_hit()));
        let (tx, rx) = watch::channel(None);
        let mapper = SynctexMapper::new(fake.clone(), rx);

        assert_eq!(mapper.from_cursor("ch1.tex", 1, 1).await.unwrap(), None);

        tx.send_replace(Some("b1".to_string()));
        assert!(mapper.from_cursor("ch1.tex", 1, 1).await.unwrap().is_some());

        tx.send_replace(Some("b2".to_string()));
        mapper.from_cursor("ch1.tex", 1, 1).await.unwrap();
        fake.with(|state| {
            let ids: Vec<&str> = state.view_queries.iter().map(|(id, _)| id.as_str()).collect();
            assert_eq!(ids, vec!["b1", "b2"]);
        });
    }

    #[test]
    fn stale_results_are_discarded() {
        let fake = Arc::new(FakeCompileService::default());
        let (tx, rx) = watch::channel(Some("b1".to_string()));
        let mapper = SynctexMapper::new(fake, rx);

        tx.send_replace(Some("b2".to_string()));
        assert_eq!(mapper.if_current("b1", Some(view_hit())), None);
        assert_eq!(mapper.if_current("b2", Some(view_hit())), Some(view_hit()));
    }
}
