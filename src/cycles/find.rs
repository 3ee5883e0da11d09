//! Generic directed-cycle detection
//!
//! An iterative depth-first search parameterized over a "children of a
//! node" function, so it runs over the store, over a mutable edges map, or
//! over any ad-hoc adjacency the caller owns. Real dependency graphs reach
//! traversal depths in the hundreds of thousands, past any practical native
//! call-stack limit, so the search keeps an explicit stack of
//! (node, remaining-children) frames.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Find one cycle reachable from `start`, if any.
///
/// The result is ordered so that consecutive elements are connected by real
/// edges and the last element has an edge back to the first; walking it
/// start to end returns to its own first element. `None` once every node
/// reachable from `start` has been exhausted without revisiting an active
/// ancestor.
pub fn find_cycle<N, F, I>(start: N, mut children_of: F) -> Option<Vec<N>>
where
    N: Copy + Eq + Hash,
    F: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut visited: HashSet<N> = HashSet::from([start]);
    let mut node_stack: Vec<N> = vec![start];
    let mut child_iters = vec![children_of(start).into_iter()];
    // node currently on the stack -> its stack position
    let mut stack_positions: HashMap<N, usize> = HashMap::from([(start, 0)]);

    while let Some(children) = child_iters.last_mut() {
        match children.next() {
            None => {
                child_iters.pop();
                if let Some(finished) = node_stack.pop() {
                    stack_positions.remove(&finished);
                }
            }
            Some(child) => {
                if let Some(&position) = stack_positions.get(&child) {
                    // the child is an active ancestor: the stack slice from
                    // its position to the top closes a cycle
                    return Some(node_stack[position..].to_vec());
                }
                if !visited.insert(child) {
                    continue;
                }
                stack_positions.insert(child, node_stack.len());
                node_stack.push(child);
                child_iters.push(children_of(child).into_iter());
            }
        }
    }

    None
}
