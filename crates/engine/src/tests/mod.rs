mod grounding_examples;
