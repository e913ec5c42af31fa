/**
 * OpList Tests
 *
 * Linking, stale ids and sentinel handling of the operation list.
 */

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use template_pipeline::template::pipeline::ir::ops::{create_text_op, CreateOp};
    use template_pipeline::template::pipeline::ir::{ListId, OpKind, OpList, XrefId};
    use template_pipeline::PipelineError;

    fn text(n: usize) -> CreateOp {
        create_text_op(XrefId(n), format!("t{n}"))
    }

    fn values(list: &OpList<CreateOp>) -> Vec<String> {
        list.iter()
            .map(|op| match op {
                CreateOp::Text(text) => text.initial_value.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_push_and_prepend_keep_order() {
        let mut list = OpList::new(ListId(0));
        list.push(text(2));
        list.push(text(3));
        list.prepend(vec![text(0), text(1)]);

        assert_eq!(values(&list), vec!["t0", "t1", "t2", "t3"]);
        assert_eq!(list.len(), 4);
        list.validate().unwrap();
    }

    #[test]
    fn test_insert_relative_to_sentinels() {
        let mut list = OpList::new(ListId(0));
        let middle = list.push(text(1));
        list.insert_after(list.head(), text(0)).unwrap();
        list.insert_before(list.tail(), text(3)).unwrap();
        list.insert_after(middle, text(2)).unwrap();

        assert_eq!(values(&list), vec!["t0", "t1", "t2", "t3"]);
        assert_eq!(
            list.insert_before(list.head(), text(9)),
            Err(PipelineError::SentinelMutation(ListId(0)))
        );
        assert_eq!(
            list.insert_after(list.tail(), text(9)),
            Err(PipelineError::SentinelMutation(ListId(0)))
        );
        assert_eq!(list.kind(list.tail()).unwrap(), OpKind::ListEnd);
    }

    #[test]
    fn test_removed_ids_go_stale() {
        let mut list = OpList::new(ListId(0));
        let first = list.push(text(0));
        let second = list.push(text(1));

        list.remove(first).unwrap();
        // The freed node is reused, but under a new id.
        let third = list.push(text(2));

        assert_ne!(first, third);
        assert!(!list.contains(first));
        assert_eq!(list.get(first).unwrap_err(), PipelineError::StaleOp(first));
        assert_eq!(list.remove(first).unwrap_err(), PipelineError::StaleOp(first));
        assert_eq!(list.first(), Some(second));
        assert_eq!(values(&list), vec!["t1", "t2"]);
        list.validate().unwrap();
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut list = OpList::new(ListId(0));
        list.push(text(0));
        let old = list.push(text(1));
        list.push(text(2));

        let (new, replaced) = list.replace(old, text(7)).unwrap();

        assert!(matches!(replaced, CreateOp::Text(t) if t.initial_value == "t1"));
        assert!(!list.contains(old));
        assert!(list.contains(new));
        assert_eq!(values(&list), vec!["t0", "t7", "t2"]);
    }

    #[test]
    fn test_ids_from_other_lists_are_rejected() {
        let mut a = OpList::new(ListId(0));
        let mut b: OpList<CreateOp> = OpList::new(ListId(1));
        let id = a.push(text(0));

        assert_eq!(
            b.remove(id).unwrap_err(),
            PipelineError::OpNotOwned {
                op: id,
                list: ListId(1)
            }
        );
    }

    #[test]
    fn test_navigation_and_take_all() {
        let mut list = OpList::new(ListId(0));
        let a = list.push(text(0));
        let b = list.push(text(1));

        assert_eq!(list.next(a), Some(b));
        assert_eq!(list.prev(b), Some(a));
        assert_eq!(list.next(b), None);
        assert_eq!(list.last(), Some(b));

        let taken = list.take_all();
        assert_eq!(taken.len(), 2);
        assert!(list.is_empty());
        assert_eq!(list.first(), None);
        list.validate().unwrap();
    }
}
