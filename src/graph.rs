use crate::api::Entity;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// How an account relates to the queried user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Mutual,
    Follower,
    Following,
    None,
}

/// Followers that are also followed back, in follower order.
pub fn mutual_follows(followers: &[Entity], followings: &[Entity]) -> Vec<Entity> {
    let following_ids: HashSet<u64> = followings.iter().map(|e| e.id).collect();
    followers
        .iter()
        .filter(|e| following_ids.contains(&e.id))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowGraph {
    pub followers: Vec<Entity>,
    pub followings: Vec<Entity>,
    pub mutual_follows: Vec<Entity>,
    #[serde(skip)]
    relations: HashMap<u64, Relationship>,
}

impl FollowGraph {
    pub fn new(followers: Vec<Entity>, followings: Vec<Entity>) -> Self {
        let mutual_follows = mutual_follows(&followers, &followings);

        // Later inserts win: mutual over follower over following.
        let mut relations = HashMap::with_capacity(followers.len() + followings.len());
        relations.extend(followings.iter().map(|e| (e.id, Relationship::Following)));
        relations.extend(followers.iter().map(|e| (e.id, Relationship::Follower)));
        relations.extend(mutual_follows.iter().map(|e| (e.id, Relationship::Mutual)));

        Self {
            followers,
            followings,
            mutual_follows,
            relations,
        }
    }

    pub fn mutual_ids(&self) -> HashSet<u64> {
        self.mutual_follows.iter().map(|e| e.id).collect()
    }

    /// Followings not already covered by the mutual set.
    pub fn non_mutual_followings(&self) -> Vec<Entity> {
        let mutual = self.mutual_ids();
        self.followings
            .iter()
            .filter(|e| !mutual.contains(&e.id))
            .cloned()
            .collect()
    }

    pub fn relationship(&self, id: u64) -> Relationship {
        self.relations
            .get(&id)
            .copied()
            .unwrap_or(Relationship::None)
    }
}
