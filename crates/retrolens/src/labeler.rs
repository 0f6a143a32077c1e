//! Representative labels for feedback clusters

use std::collections::BTreeMap;

use crate::feedback::FeedbackItem;

/// Maximum label length in characters before the ellipsis
pub const LABEL_MAX_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Label each cluster with its shortest member message
///
/// Ties on length go to the member that appears first in `items`.
pub fn label_clusters(assignment: &[usize], items: &[FeedbackItem]) -> BTreeMap<usize, String> {
  let mut shortest: BTreeMap<usize, &str> = BTreeMap::new();

  for (cluster, item) in assignment.iter().zip(items) {
    let message = item.message.as_str();
    shortest
      .entry(*cluster)
      .and_modify(|current| {
        if message.chars().count() < current.chars().count() {
          *current = message;
        }
      })
      .or_insert(message);
  }

  shortest.into_iter().map(|(cluster, message)| (cluster, truncate_label(message))).collect()
}

/// Cut a message to [`LABEL_MAX_CHARS`] characters, marking the cut with `...`
pub fn truncate_label(message: &str) -> String {
  match message.char_indices().nth(LABEL_MAX_CHARS) {
    Some((byte_index, _)) => format!("{}{ELLIPSIS}", &message[..byte_index]),
    None => message.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::feedback::FeedbackType;

  fn items(messages: &[&str]) -> Vec<FeedbackItem> {
    messages.iter().map(|m| FeedbackItem::new("retro", FeedbackType::Well, m)).collect()
  }

  #[test]
  fn test_shortest_message_wins() {
    let items = items(&["Deploys were smooth this sprint", "CI is fast", "Pairing helped a lot"]);
    let labels = label_clusters(&[0, 0, 0], &items);

    assert_eq!(labels.len(), 1);
    assert_eq!(labels[&0], "CI is fast");
  }

  #[test]
  fn test_first_occurrence_wins_ties() {
    let items = items(&["aaaa", "bbbb", "cc dd"]);
    let labels = label_clusters(&[1, 1, 1], &items);

    assert_eq!(labels[&1], "aaaa");
  }

  #[test]
  fn test_each_cluster_gets_its_own_label() {
    let items = items(&["Standups dragged", "Flaky tests", "Great demo", "Demo prep"]);
    let labels = label_clusters(&[0, 0, 1, 1], &items);

    assert_eq!(labels[&0], "Flaky tests");
    assert_eq!(labels[&1], "Demo prep");
  }

  #[test]
  fn test_singleton_cluster_labels_itself() {
    let message = "x".repeat(70);
    let items = items(&[message.as_str()]);
    let labels = label_clusters(&[0], &items);

    assert_eq!(labels[&0], format!("{}...", "x".repeat(50)));
  }

  #[test]
  fn test_truncate_long_message() {
    let message = "m".repeat(60);
    let label = truncate_label(&message);

    assert_eq!(label.chars().count(), 53);
    assert!(label.ends_with("..."));
    assert_eq!(&label[..50], &message[..50]);
  }

  #[test]
  fn test_short_messages_unchanged() {
    assert_eq!(truncate_label("Release went well"), "Release went well");
    let exact = "e".repeat(50);
    assert_eq!(truncate_label(&exact), exact);
  }

  #[test]
  fn test_truncation_respects_char_boundaries() {
    let message = "é".repeat(55);
    let label = truncate_label(&message);

    assert_eq!(label, format!("{}...", "é".repeat(50)));
  }
}
