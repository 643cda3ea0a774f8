/*!
Development kit for the bleak fleet

Lets the logger be developed and tested without real collector hardware:
- `collector_stub`: an in-process HTTP server speaking the collector sync
  protocol, with canned payloads and recorded registrations for assertions
- `test_utils`: logging setup, jsonl read-back helpers, payload builders
*/

pub mod collector_stub;
pub mod test_utils;
