use s3repo::repo::{RepoEntry, Replacement, S3Repository};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Serialize)]
struct RepoSummary<'a> {
    id: &'a str,
    kind: &'static str,
    base_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

impl<'a> From<&'a RepoEntry> for RepoSummary<'a> {
    fn from(entry: &'a RepoEntry) -> Self {
        match entry {
            RepoEntry::S3(repo) => RepoSummary {
                id: &repo.id,
                kind: "s3",
                base_url: &repo.base_url,
                bucket: Some(repo.bucket()),
                arch: Some(repo.arch()),
                profile: Some(&repo.profile),
                region: Some(&repo.region),
            },
            RepoEntry::Plain(definition) => RepoSummary {
                id: &definition.id,
                kind: "plain",
                base_url: definition.baseurl.first().map_or("", String::as_str),
                bucket: None,
                arch: None,
                profile: None,
                region: None,
            },
        }
    }
}

pub fn list(replacement: &Replacement, json: bool) -> Result<(), AnyError> {
    let summaries: Vec<RepoSummary<'_>> = replacement.entries.iter().map(RepoSummary::from).collect();

    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &summaries)?;
        writeln!(out)?;
    } else {
        for summary in &summaries {
            writeln!(
                out,
                "{:<24} {:<6} {:<48} {}",
                summary.id,
                summary.kind,
                summary.base_url,
                summary.profile.unwrap_or("-")
            )?;
        }
    }

    for rejected in &replacement.rejected {
        eprintln!("rejected: {rejected}");
    }

    Ok(())
}

fn s3_repository<'a>(replacement: &'a Replacement, id: &str) -> Result<&'a S3Repository, AnyError> {
    match replacement.find(id) {
        Some(RepoEntry::S3(repo)) => Ok(repo),
        Some(RepoEntry::Plain(_)) => Err(format!("repository '{id}' is not served from a bucket").into()),
        None => Err(format!("repository '{id}' is not configured or was rejected").into()),
    }
}

pub fn fetch(replacement: &Replacement, id: &str, path: &str, dest: &Path) -> Result<(), AnyError> {
    let grabber = s3_repository(replacement, id)?.grab()?;
    let written = grabber.fetch_to_file(path, dest)?;
    info!(repo = id, path = %written.display(), "Fetched");
    Ok(())
}

pub fn cat(replacement: &Replacement, id: &str, path: &str, whole: bool) -> Result<(), AnyError> {
    let grabber = s3_repository(replacement, id)?.grab()?;
    let mut out = io::stdout().lock();

    if whole {
        out.write_all(&grabber.read_all(path)?)?;
    } else {
        let mut reader = grabber.open_stream(path)?;
        io::copy(&mut reader, &mut out)?;
    }
    out.flush()?;

    Ok(())
}
