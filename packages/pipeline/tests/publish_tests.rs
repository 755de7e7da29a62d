//! Publisher against a temporary site directory and in-memory mirror.

use std::sync::Arc;

use pipeline_core::publish::mirror::{blob_path, entry_key, REPORTS_LIST_KEY};
use pipeline_core::publish::{
    BlobStore, KvStore, MemoryBlobStore, MemoryKvStore, Mirror, PublishOutcome, Publisher,
    RecordingVcs, SiteIndex,
};
use report::testing::{sample_report, SAMPLE_SLUG};
use report::Report;
use tempfile::TempDir;

struct Site {
    dir: TempDir,
    vcs: RecordingVcs,
    blobs: MemoryBlobStore,
    kv: MemoryKvStore,
}

impl Site {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            vcs: RecordingVcs::new(),
            blobs: MemoryBlobStore::new(),
            kv: MemoryKvStore::new(),
        }
    }

    fn publisher(&self) -> Publisher {
        Publisher::new(self.dir.path().join("reports"), self.dir.path().join("reports/index.json"))
            .with_vcs(Arc::new(self.vcs.clone()))
            .with_mirror(Mirror::new(
                Arc::new(self.blobs.clone()),
                Arc::new(self.kv.clone()),
            ))
    }

    fn index(&self) -> SiteIndex {
        SiteIndex::load(&self.dir.path().join("reports/index.json")).unwrap()
    }
}

fn report_with_slug(slug: &str) -> Report {
    Report {
        slug: slug.to_string(),
        ..sample_report()
    }
}

#[tokio::test]
async fn publishes_page_index_commit_and_mirror() {
    let site = Site::new();
    let report = sample_report();
    let html = report::render(&report);

    let outcome = site
        .publisher()
        .publish(&report, &html, "Flat earth resurgence", false)
        .await
        .unwrap();

    let PublishOutcome {
        html_path,
        page_written,
        branch,
        mirror_url,
    } = outcome;
    assert!(page_written);
    assert_eq!(std::fs::read_to_string(&html_path).unwrap(), html);
    assert_eq!(branch.as_deref(), Some("report/flat-earth-20260215"));
    assert!(mirror_url.unwrap().ends_with("reports/flat-earth-20260215.html"));

    let commits = site.vcs.commits();
    assert_eq!(commits[0].paths.len(), 2);
    assert!(commits[0].paths.contains(&html_path));
    assert!(commits[0].message.contains("Flat earth resurgence"));

    assert_eq!(site.index().entries()[0].slug, SAMPLE_SLUG);
    assert_eq!(site.kv.list(REPORTS_LIST_KEY), vec![SAMPLE_SLUG.to_string()]);
    assert!(site.kv.get(&entry_key(SAMPLE_SLUG)).await.unwrap().is_some());
    assert_eq!(
        site.blobs.get(&blob_path(SAMPLE_SLUG)).await.unwrap(),
        Some(html.into_bytes())
    );
}

#[tokio::test]
async fn newest_report_is_listed_first() {
    let site = Site::new();
    let publisher = site.publisher();
    for slug in ["first-20260213", "second-20260214", "third-20260215"] {
        let report = report_with_slug(slug);
        publisher
            .publish(&report, &report::render(&report), "topic", false)
            .await
            .unwrap();
    }

    let listed: Vec<(usize, String)> = site
        .index()
        .entries()
        .iter()
        .map(|e| (e.index, e.slug.clone()))
        .collect();
    assert_eq!(
        listed,
        vec![
            (0, "third-20260215".to_string()),
            (1, "second-20260214".to_string()),
            (2, "first-20260213".to_string()),
        ]
    );
    assert_eq!(
        site.kv.list(REPORTS_LIST_KEY),
        vec!["third-20260215", "second-20260214", "first-20260213"]
    );
}

#[tokio::test]
async fn existing_page_is_left_alone_without_force() {
    let site = Site::new();
    let publisher = site.publisher();
    let report = sample_report();
    publisher.publish(&report, "<html>v1</html>", "t", false).await.unwrap();

    let outcome = publisher.publish(&report, "<html>v2</html>", "t", false).await.unwrap();

    assert!(!outcome.page_written);
    assert_eq!(
        std::fs::read_to_string(publisher.html_path(SAMPLE_SLUG)).unwrap(),
        "<html>v1</html>"
    );
    assert_eq!(site.vcs.commits().len(), 1);
    assert_eq!(site.index().entries().len(), 1);
    assert_eq!(
        site.blobs.get(&blob_path(SAMPLE_SLUG)).await.unwrap(),
        Some(b"<html>v1</html>".to_vec())
    );
}

#[tokio::test]
async fn repeating_a_failed_publish_finishes_the_missing_steps() {
    let site = Site {
        vcs: RecordingVcs::new().failing(1),
        ..Site::new()
    };
    let publisher = site.publisher();
    let report = sample_report();

    assert!(publisher.publish(&report, "<html>v1</html>", "t", false).await.is_err());
    assert!(publisher.is_published(SAMPLE_SLUG));
    assert!(site.vcs.commits().is_empty());
    assert!(site.kv.list(REPORTS_LIST_KEY).is_empty());

    let outcome = publisher.publish(&report, "<html>v1</html>", "t", false).await.unwrap();

    assert!(!outcome.page_written);
    assert_eq!(outcome.branch.as_deref(), Some("report/flat-earth-20260215"));
    assert!(outcome.mirror_url.is_some());
    assert_eq!(site.vcs.commits().len(), 1);
    assert_eq!(site.index().entries().len(), 1);
    assert_eq!(site.kv.list(REPORTS_LIST_KEY), vec![SAMPLE_SLUG.to_string()]);
}

#[tokio::test]
async fn force_rewrites_the_page_without_a_second_listing() {
    let site = Site::new();
    let publisher = site.publisher();
    let report = sample_report();
    publisher.publish(&report, "<html>v1</html>", "t", false).await.unwrap();

    let outcome = publisher.publish(&report, "<html>v2</html>", "t", true).await.unwrap();

    assert!(outcome.page_written);
    assert_eq!(
        std::fs::read_to_string(publisher.html_path(SAMPLE_SLUG)).unwrap(),
        "<html>v2</html>"
    );
    assert_eq!(site.vcs.commits().len(), 2);
    assert_eq!(site.index().entries().len(), 1);
    assert_eq!(site.kv.list(REPORTS_LIST_KEY), vec![SAMPLE_SLUG.to_string()]);
    assert_eq!(site.blobs.list("reports/").await.unwrap().len(), 1);
}

#[tokio::test]
async fn publisher_without_extras_only_writes_files() {
    let dir = TempDir::new().unwrap();
    let publisher = Publisher::new(dir.path().join("r"), dir.path().join("r/index.json"));
    let report = sample_report();

    let outcome = publisher.publish(&report, "<html></html>", "t", false).await.unwrap();

    assert_eq!(outcome.branch, None);
    assert_eq!(outcome.mirror_url, None);
    assert!(publisher.is_published(SAMPLE_SLUG));
}
