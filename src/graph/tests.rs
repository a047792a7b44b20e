use super::*;
use crate::catalog::Pads;
use pretty_assertions::assert_eq;

fn video_pipe(s: &mut Session) -> LinkId {
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("hflip")).unwrap();
    let out = s.output(c, 0).unwrap();
    s.set_media_type(out, MediaType::Video).unwrap();
    out
}

/// `discard` needs a media type; this sinks pipes that have none.
fn sink(s: &mut Session, link: LinkId) {
    let c = s.start(&[link]).unwrap();
    s.extend(c, Operation::new("nullsink")).unwrap();
}

#[test]
fn extend_on_placeholder_reuses_the_handle() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let same = s.extend(c, Operation::new("crop")).unwrap();
    assert_eq!(c, same);
    let next = s.extend(same, Operation::new("scale")).unwrap();
    assert_ne!(c, next);
    assert!(matches!(
        s.extend(c, Operation::new("hflip")),
        Err(GraphError::Structural(_))
    ));
}

#[test]
fn connect_rules() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let empty = s.start(&[v]).unwrap();
    let p = s.pipe().unwrap();
    assert!(matches!(s.connect(empty, &[p]), Err(GraphError::Structural(_))));

    let c = s.extend(empty, Operation::new("hflip")).unwrap();
    s.connect(c, &[p]).unwrap();
    assert!(matches!(s.connect(c, &[p]), Err(GraphError::Binding(_))));
    // connected outputs come first when iterating
    assert_eq!(s.output(c, 0).unwrap(), p);
}

#[test]
fn foreign_pipes_are_rejected() {
    let mut other = Session::new();
    let foreign = other.pipe().unwrap();

    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("hflip")).unwrap();
    let err = s.connect(c, &[foreign]).unwrap_err();
    assert!(err.to_string().contains("not created by this session"));
    assert!(s.start(&[foreign]).is_err());
}

#[test]
fn outputs_are_allocated_lazily_with_hints() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("select")).unwrap();
    let outs = s.take_outputs(c, 2).unwrap();
    assert_eq!(s.get_link(outs[1]).unwrap().hint(), Some("select.output.1"));
    assert_eq!(s.output(c, 0).unwrap(), outs[0]);
}

#[test]
fn unbounded_unpacking_is_stopped() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("select")).unwrap();
    let all: Result<Vec<LinkId>> = s.outputs(c).unwrap().collect();
    assert!(matches!(all, Err(GraphError::UnboundedIteration(_))));
}

#[test]
fn fixed_pads_end_iteration() {
    let mut s = Session::new();
    let v = s.input_stream("0:a").unwrap();
    let c = s.start(&[v]).unwrap();
    let op = Operation::new("channelsplit")
        .with_outputs(Pads::Fixed(vec![MediaType::Audio, MediaType::Audio]));
    let c = s.extend(c, op).unwrap();
    let outs: Vec<LinkId> = s.outputs(c).unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(outs.len(), 2);
    assert_eq!(s.get_link(outs[0]).unwrap().media_type(), MediaType::Audio);
    assert!(matches!(s.output(c, 2), Err(GraphError::Arity { count: 2, .. })));
}

#[test]
fn placeholder_iterates_and_forks_its_inputs() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let a = s.input_stream("0:a").unwrap();
    let c = s.start(&[v, a]).unwrap();
    let inputs: Vec<LinkId> = s.outputs(c).unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(inputs, vec![v, a]);

    let f = s.fork(c, 1).unwrap();
    assert_eq!(s.output(f, 0).unwrap(), v);
    assert!(s.fork(c, 3).is_err());
}

#[test]
fn fork_with_operation_reads_its_outputs() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("hflip")).unwrap();
    let f = s.fork(c, 1).unwrap();
    let f = s.extend(f, Operation::new("vflip")).unwrap();
    let out = s.output(f, 0).unwrap();
    s.complete([("out", out)]).unwrap();
    assert_eq!(s.render(), "[0:v]hflip[_0];[_0]vflip[out]");
}

#[test]
fn link_splices_and_rejects_cycles() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let a = s.start(&[v]).unwrap();
    let a = s.extend(a, Operation::new("hflip")).unwrap();
    let b = s.start(&[]).unwrap();
    let b = s.extend(b, Operation::new("vflip")).unwrap();

    s.link(a, b).unwrap();
    assert!(matches!(s.link(a, b), Err(GraphError::Structural(_))));
    // b's sequence now contains a
    let err = s.link(b, a).unwrap_err();
    assert!(err.to_string().contains("cycle"));

    let out = s.output(b, 0).unwrap();
    s.complete([("out", out)]).unwrap();
    assert_eq!(s.render(), "[0:v]hflip,vflip[out]");
}

#[test]
fn link_requires_an_operation() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let a = s.start(&[v]).unwrap();
    let b = s.start(&[]).unwrap();
    assert!(matches!(s.link(a, b), Err(GraphError::Structural(_))));
}

#[test]
fn fan_out_moves_first_consumer_and_counts() {
    let mut s = Session::new();
    let a = video_pipe(&mut s);
    let mut outs = Vec::new();
    for name in ["vflip", "negate", "edgedetect"] {
        let c = s.start(&[a]).unwrap();
        let c = s.extend(c, Operation::new(name)).unwrap();
        outs.push(s.output(c, 0).unwrap());
    }
    assert_eq!(s.reference_count(a).unwrap(), 1);
    s.complete([("x", outs[0]), ("y", outs[1]), ("z", outs[2])])
        .unwrap();
    assert_eq!(
        s.render(),
        "[0:v]hflip[_0];[_2]vflip[x];[_3]negate[y];[_0]split='3'[_2][_3][_5];[_5]edgedetect[z]"
    );
}

#[test]
fn fan_out_needs_media_type() {
    let mut s = Session::new();
    let p = s.named_pipe("raw").unwrap();
    let c1 = s.start(&[p]).unwrap();
    s.extend(c1, Operation::new("hflip")).unwrap();
    let c2 = s.start(&[p]).unwrap();
    let err = s.extend(c2, Operation::new("vflip")).unwrap_err();
    assert!(matches!(err, GraphError::MissingMapping(_)));
    assert!(err.to_string().contains("[raw]"));
}

#[test]
fn export_of_consumed_pipe_takes_a_fresh_branch() {
    let mut s = Session::new();
    let a = video_pipe(&mut s);
    let c = s.start(&[a]).unwrap();
    let c = s.extend(c, Operation::new("vflip")).unwrap();
    let main = s.output(c, 0).unwrap();
    s.complete([("tap", a), ("main", main)]).unwrap();
    assert_eq!(
        s.render(),
        "[0:v]hflip[_3];[_2]vflip[main];[_3]split='2'[_2][tap]"
    );
}

#[test]
fn exporting_a_fixed_pipe_inserts_pass_through() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let mid = s.named_pipe("mid").unwrap();
    s.set_media_type(mid, MediaType::Video).unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("hflip")).unwrap();
    s.connect(c, &[mid]).unwrap();
    s.complete([("other", mid)]).unwrap();
    assert_eq!(s.render(), "[0:v]hflip[mid];[mid]null[other]");
}

#[test]
fn exporting_under_the_current_name_keeps_it() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let mid = s.named_pipe("mid").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("hflip")).unwrap();
    s.connect(c, &[mid]).unwrap();
    s.complete([("mid", mid)]).unwrap();
    assert_eq!(s.render(), "[0:v]hflip[mid]");
}

#[test]
fn dangling_pipes_are_reported_by_side() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s.extend(c, Operation::new("hflip")).unwrap();
    s.output(c, 0).unwrap();
    let err = s.complete(Vec::<(String, LinkId)>::new()).unwrap_err();
    assert!(err.to_string().contains("not bound to any input"));
    assert!(err.to_string().contains("hflip.output.0"));

    let mut s = Session::new();
    let p = s.pipe().unwrap();
    let c = s.start(&[p]).unwrap();
    s.extend(c, Operation::new("nullsink")).unwrap();
    let err = s.complete(Vec::<(String, LinkId)>::new()).unwrap_err();
    assert!(err.to_string().contains("not bound to any output"));
}

#[test]
fn duplicate_final_names_are_rejected() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let x1 = s.named_pipe("x").unwrap();
    let x2 = s.named_pipe("x").unwrap();
    for x in [x1, x2] {
        let c = s.start(&[v]).unwrap();
        let c = s.extend(c, Operation::new("hflip")).unwrap();
        s.connect(c, &[x]).unwrap();
        sink(&mut s, x);
    }
    let err = s.complete(Vec::<(String, LinkId)>::new()).unwrap_err();
    assert!(matches!(err, GraphError::Naming(_)));
}

#[test]
fn completed_session_is_frozen() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    s.discard(v).unwrap();
    s.complete(Vec::<(String, LinkId)>::new()).unwrap();
    assert_eq!(s.start(&[v]), Err(GraphError::Completed("start")));
    assert!(matches!(s.pipe(), Err(GraphError::Completed(_))));
    assert!(s.complete(Vec::<(String, LinkId)>::new()).is_err());
}

#[test]
fn args_reflect_value_at_render_time() {
    let mut s = Session::new();
    let v = s.input_stream("0:v").unwrap();
    let c = s.start(&[v]).unwrap();
    let c = s
        .extend(c, Operation::new("eq").with_args(&[Arg::map([("gamma", 1)])]))
        .unwrap();
    let op = s.chain_operation(c).unwrap().unwrap();
    let out = s.output(c, 0).unwrap();
    s.set_args(op, &[Arg::map([("gamma", 2)])]).unwrap();
    s.complete([("out", out)]).unwrap();
    assert_eq!(s.render(), "[0:v]eq='gamma=2'[out]");
}

