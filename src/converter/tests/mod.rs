mod bigram;
