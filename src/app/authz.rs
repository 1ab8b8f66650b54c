use crate::domain::engagement::Comment;
use crate::domain::post::Post;
use crate::domain::user::Identity;

/// Anything with a recorded author that can be edited or deleted.
pub trait Authored {
    fn author_id(&self) -> i64;
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// Author, staff or superuser.
pub fn can_modify<T: Authored + ?Sized>(requester: &Identity, resource: &T) -> bool {
    requester.id == resource.author_id() || requester.has_staff_override()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn identity(id: i64, is_staff: bool, is_superuser: bool) -> Identity {
        Identity {
            id,
            username: format!("user{}", id),
            is_staff,
            is_superuser,
        }
    }

    fn post_by(author_id: i64) -> Post {
        Post {
            id: 1,
            author_id,
            author_username: "author".into(),
            text: String::new(),
            image_url: None,
            video_url: None,
            attachment: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn comment_by(author_id: i64) -> Comment {
        Comment {
            id: 1,
            post_id: 1,
            author_id,
            author_username: "author".into(),
            text: "hi".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn author_may_modify_own_content() {
        let alice = identity(1, false, false);
        assert!(can_modify(&alice, &post_by(1)));
        assert!(can_modify(&alice, &comment_by(1)));
    }

    #[test]
    fn stranger_may_not_modify() {
        let bob = identity(2, false, false);
        assert!(!can_modify(&bob, &post_by(1)));
        assert!(!can_modify(&bob, &comment_by(1)));
    }

    #[test]
    fn staff_and_superuser_override() {
        let staff = identity(3, true, false);
        let root = identity(4, false, true);
        for requester in [&staff, &root] {
            assert!(can_modify(requester, &post_by(1)));
            assert!(can_modify(requester, &comment_by(1)));
        }
    }
}
