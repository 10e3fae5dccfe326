//! Concurrent check of many skills against their remote trees.
//!
//! Skills are grouped by repository (`owner/repo@branch`) before any task
//! starts. Each unique repository is fetched exactly once on the blocking
//! pool, with at most `max_concurrency` fetches in flight. When a fetch
//! resolves, the collector fans the tree (or the failure) out to every skill
//! of that group. Every input skill yields exactly one [`SkillSyncResult`];
//! result order is unspecified.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use skillsync_core::{parse_source, RepoKey, Skill, SourceCoordinate};

use crate::diff::{evaluate, SkillSyncResult};
use crate::error::{io_err, FetchError, SyncError};
use crate::remote::{RemoteTree, TreeFetcher};

type Group = Vec<(Skill, SourceCoordinate)>;

/// Check every skill, fetching each distinct repository tree once.
///
/// Skills without a `github_url` should be filtered out by the caller; any
/// that reach the scheduler are finalized as errors so none are dropped.
pub async fn check_skills(
    skills: Vec<Skill>,
    fetcher: Arc<dyn TreeFetcher>,
    max_concurrency: usize,
) -> Vec<SkillSyncResult> {
    let mut results = Vec::with_capacity(skills.len());
    let mut groups: HashMap<RepoKey, Group> = HashMap::new();

    for skill in skills {
        match skill.github_url.as_deref().map(parse_source) {
            None => {
                let message = format!("skill '{}' has no github_url", skill.name);
                results.push(SkillSyncResult::error(skill, message));
            }
            Some(Err(err)) => {
                tracing::warn!("{}: {err}", skill.name);
                results.push(SkillSyncResult::error(skill, err.to_string()));
            }
            Some(Ok(coord)) => groups
                .entry(coord.repo_key())
                .or_default()
                .push((skill, coord)),
        }
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for (key, members) in &groups {
        let coord = members[0].1.clone();
        let key = key.clone();
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let outcome = fetch_bounded(semaphore, fetcher, coord).await;
            (key, outcome)
        });
    }
    tracing::info!(
        "checking {} skill(s) across {} repositories",
        groups.values().map(Vec::len).sum::<usize>(),
        groups.len()
    );

    while let Some(joined) = tasks.join_next().await {
        let (key, outcome) = match joined {
            Ok(done) => done,
            Err(err) => {
                tracing::error!("fetch task aborted: {err}");
                continue;
            }
        };
        let Some(members) = groups.remove(&key) else {
            continue;
        };
        match outcome {
            Ok(tree) => results.extend(evaluate_group(members, tree).await),
            Err(err) => {
                tracing::warn!("remote check failed for {}: {err}", err.coordinate());
                for (skill, _) in members {
                    results.push(SkillSyncResult::error(
                        skill,
                        format!("Remote check failed: {err}"),
                    ));
                }
            }
        }
    }

    // A group whose task was lost still owes each of its skills a result.
    for (key, members) in groups.drain() {
        for (skill, _) in members {
            results.push(SkillSyncResult::error(
                skill,
                format!("Remote check failed: fetch for {key} did not complete"),
            ));
        }
    }

    results
}

/// Blocking entry point: runs [`check_skills`] on a fresh runtime.
pub fn check_skills_blocking(
    skills: Vec<Skill>,
    fetcher: Arc<dyn TreeFetcher>,
    max_concurrency: usize,
) -> Result<Vec<SkillSyncResult>, SyncError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    Ok(runtime.block_on(check_skills(skills, fetcher, max_concurrency)))
}

/// Hold a permit only while the request is in flight.
async fn fetch_bounded(
    semaphore: Arc<Semaphore>,
    fetcher: Arc<dyn TreeFetcher>,
    coord: SourceCoordinate,
) -> Result<RemoteTree, FetchError> {
    let key = coord.repo_key();
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return Err(FetchError::Network {
            coordinate: key,
            reason: "scheduler closed".to_string(),
        });
    };
    tokio::task::spawn_blocking(move || fetcher.fetch_tree(&coord))
        .await
        .unwrap_or_else(|e| {
            Err(FetchError::Network {
                coordinate: key,
                reason: format!("fetch task failed: {e}"),
            })
        })
}

/// Directory walks and hashing are blocking, so they run off the async workers.
async fn evaluate_group(members: Group, tree: RemoteTree) -> Vec<SkillSyncResult> {
    let fallback: Vec<Skill> = members.iter().map(|(skill, _)| skill.clone()).collect();
    let evaluated = tokio::task::spawn_blocking(move || {
        members
            .into_iter()
            .map(|(skill, coord)| evaluate_member(skill, &coord, &tree))
            .collect::<Vec<_>>()
    })
    .await;
    match evaluated {
        Ok(results) => results,
        Err(err) => {
            tracing::error!("evaluation task aborted: {err}");
            fallback
                .into_iter()
                .map(|skill| SkillSyncResult::error(skill, format!("Evaluation error: {err}")))
                .collect()
        }
    }
}

fn evaluate_member(skill: Skill, coord: &SourceCoordinate, tree: &RemoteTree) -> SkillSyncResult {
    match evaluate(&skill, coord, tree) {
        Ok(evaluation) => SkillSyncResult::from_evaluation(skill, evaluation),
        Err(err) => {
            tracing::warn!("{}: evaluation failed: {err}", skill.name);
            SkillSyncResult::error(skill, format!("Evaluation error: {err}"))
        }
    }
}
