//! Repository contract tests, run against every backend

use super::*;
use crate::message::Message;
use std::time::Duration;
use tempfile::TempDir;

fn conversation_with(prompt: &str, answer: &str) -> Conversation {
    let mut conversation = Conversation::with_system("You are helpful.");
    let root = conversation.session().leaf_message().unwrap().clone();
    let user = Message::user(prompt).reply_to(&root);
    let reply = Message::assistant(answer).reply_to(&user);
    conversation.register(user).unwrap();
    conversation.register(reply).unwrap();
    conversation
}

async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

async fn round_trip_preserves_graph(repo: &dyn ConversationRepository) {
    let mut conversation = conversation_with("hello", "hi");
    conversation.set_title("Greetings");
    let leaf = conversation.leaf().unwrap().to_string();
    // A sibling branch that is not on the active chain
    let sibling = {
        let root = conversation.view().unwrap().first().unwrap().clone();
        Message::user("other branch").reply_to(&root)
    };
    conversation.register(sibling).unwrap();
    conversation.session_mut().checkout(&leaf).unwrap();

    repo.save(&conversation, Some("greet")).await.unwrap();
    let loaded = repo.load(conversation.id(), None).await.unwrap().unwrap();

    assert_eq!(loaded.id(), conversation.id());
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.leaf(), Some(leaf.as_str()));
    assert_eq!(loaded.title(), Some("Greetings"));
    assert_eq!(loaded.view().unwrap().roles(), "SUA");
}

async fn missing_is_none(repo: &dyn ConversationRepository) {
    assert!(repo.load("nope", None).await.unwrap().is_none());
    assert!(repo.load_by_name("nobody").await.unwrap().is_none());
    assert!(repo.last().await.unwrap().is_none());
    assert!(!repo.remove("nope").await.unwrap());
}

async fn name_is_preserved_on_upsert(repo: &dyn ConversationRepository) {
    let mut conversation = conversation_with("q", "a");
    repo.save(&conversation, Some("keeper")).await.unwrap();

    let leaf = conversation.session().leaf_message().unwrap().clone();
    let follow_up = Message::user("more").reply_to(&leaf);
    conversation.register(follow_up).unwrap();
    repo.save(&conversation, None).await.unwrap();

    let by_name = repo.load_by_name("keeper").await.unwrap().unwrap();
    assert_eq!(by_name.len(), 4);

    let listed = repo.list(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name.as_deref(), Some("keeper"));
    assert_eq!(listed[0].message_count, 4);
}

async fn load_falls_back_to_name(repo: &dyn ConversationRepository) {
    let conversation = conversation_with("q", "a");
    repo.save(&conversation, Some("handle")).await.unwrap();

    let loaded = repo.load("unknown-id", Some("handle")).await.unwrap().unwrap();
    assert_eq!(loaded.id(), conversation.id());
}

async fn list_orders_newest_first(repo: &dyn ConversationRepository) {
    let first = conversation_with("one", "1");
    let second = conversation_with("two", "2");
    let third = conversation_with("three", "3");
    for conversation in [&first, &second, &third] {
        repo.save(conversation, None).await.unwrap();
        tick().await;
    }

    let ids: Vec<String> = repo
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.conversation_id)
        .collect();
    assert_eq!(ids, vec![third.id(), second.id(), first.id()]);
    assert_eq!(repo.list(Some(2)).await.unwrap().len(), 2);

    let last = repo.last().await.unwrap().unwrap();
    assert_eq!(last.id(), third.id());

    repo.load(first.id(), None).await.unwrap();
    assert_eq!(repo.last().await.unwrap().unwrap().id(), first.id());
}

async fn prune_keeps_newest(repo: &dyn ConversationRepository) {
    let mut ids = Vec::new();
    for i in 0..4 {
        let conversation = conversation_with(&format!("q{}", i), "a");
        repo.save(&conversation, None).await.unwrap();
        ids.push(conversation.id().to_string());
        tick().await;
    }

    assert_eq!(repo.prune(2).await.unwrap(), 2);
    let remaining: Vec<String> = repo
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.conversation_id)
        .collect();
    assert_eq!(remaining, vec![ids[3].clone(), ids[2].clone()]);
}

async fn remove_and_wipe(repo: &dyn ConversationRepository) {
    let a = conversation_with("a", "1");
    let b = conversation_with("b", "2");
    repo.save(&a, None).await.unwrap();
    repo.save(&b, None).await.unwrap();

    assert!(repo.remove(a.id()).await.unwrap());
    assert!(repo.load(a.id(), None).await.unwrap().is_none());
    assert_eq!(repo.load_all().await.unwrap().len(), 1);

    assert_eq!(repo.wipe().await.unwrap(), 1);
    assert!(repo.list(None).await.unwrap().is_empty());
    assert!(repo.last().await.unwrap().is_none());
}

macro_rules! contract_tests {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            #[tokio::test]
            async fn test_round_trip_preserves_graph() {
                let (_guard, repo) = $make;
                round_trip_preserves_graph(&repo).await;
            }

            #[tokio::test]
            async fn test_missing_is_none() {
                let (_guard, repo) = $make;
                missing_is_none(&repo).await;
            }

            #[tokio::test]
            async fn test_name_is_preserved_on_upsert() {
                let (_guard, repo) = $make;
                name_is_preserved_on_upsert(&repo).await;
            }

            #[tokio::test]
            async fn test_load_falls_back_to_name() {
                let (_guard, repo) = $make;
                load_falls_back_to_name(&repo).await;
            }

            #[tokio::test]
            async fn test_list_orders_newest_first() {
                let (_guard, repo) = $make;
                list_orders_newest_first(&repo).await;
            }

            #[tokio::test]
            async fn test_prune_keeps_newest() {
                let (_guard, repo) = $make;
                prune_keeps_newest(&repo).await;
            }

            #[tokio::test]
            async fn test_remove_and_wipe() {
                let (_guard, repo) = $make;
                remove_and_wipe(&repo).await;
            }
        }
    };
}

contract_tests!(memory, ((), MemoryRepository::new("proj")));
contract_tests!(file, {
    let dir = TempDir::new().unwrap();
    let repo = FileRepository::new(dir.path(), "proj").unwrap();
    (dir, repo)
});

#[tokio::test]
async fn test_projects_are_isolated() {
    let dir = TempDir::new().unwrap();
    let alpha = FileRepository::new(dir.path(), "alpha").unwrap();
    let beta = FileRepository::new(dir.path(), "beta").unwrap();

    alpha.save(&conversation_with("q", "a"), None).await.unwrap();
    assert!(beta.list(None).await.unwrap().is_empty());
    assert_eq!(beta.wipe().await.unwrap(), 0);
    assert_eq!(alpha.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_corrupted_file_is_skipped_in_listing() {
    let dir = TempDir::new().unwrap();
    let repo = FileRepository::new(dir.path(), "proj").unwrap();
    repo.save(&conversation_with("q", "a"), None).await.unwrap();
    std::fs::write(repo.project_dir().join("broken.json"), "{ nope").unwrap();

    assert_eq!(repo.list(None).await.unwrap().len(), 1);
    assert!(repo.load("broken", None).await.is_err());
}

#[tokio::test]
async fn test_unrestorable_record_does_not_become_last() {
    let dir = TempDir::new().unwrap();
    let repo = FileRepository::new(dir.path(), "proj").unwrap();
    let good = conversation_with("q", "a");
    repo.save(&good, None).await.unwrap();

    let stored = std::fs::read_to_string(repo.project_dir().join(format!("{}.json", good.id())))
        .unwrap();
    let mut damaged: serde_json::Value = serde_json::from_str(&stored).unwrap();
    damaged["conversation_id"] = "damaged".into();
    damaged["name"] = "wreck".into();
    damaged["leaf"] = "ghost".into();
    std::fs::write(
        repo.project_dir().join("damaged.json"),
        serde_json::to_string(&damaged).unwrap(),
    )
    .unwrap();

    assert!(repo.load("damaged", None).await.is_err());
    assert!(repo.load_by_name("wreck").await.is_err());
    assert_eq!(repo.last().await.unwrap().unwrap().id(), good.id());
}

#[tokio::test]
async fn test_unsafe_identifiers_are_not_found() {
    let dir = TempDir::new().unwrap();
    let repo = FileRepository::new(dir.path(), "proj").unwrap();
    assert!(repo.load("../escape", None).await.unwrap().is_none());
    assert!(FileRepository::new(dir.path(), "../up").is_err());
}

#[test]
fn test_persistence_mode_parsing() {
    assert_eq!("RESUME".parse::<PersistenceMode>().unwrap(), PersistenceMode::Resume);
    assert_eq!("chat".parse::<PersistenceMode>().unwrap(), PersistenceMode::Chat);
    assert_eq!(PersistenceMode::Overwrite.to_string(), "overwrite");
    assert!("sometimes".parse::<PersistenceMode>().is_err());
    assert_eq!(PersistenceMode::default(), PersistenceMode::Resume);
}
